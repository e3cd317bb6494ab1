//! Published media track
//!
//! Wraps the persisted [`TrackInfo`] of a publication together with the
//! receivers bound for it, one per simulcast layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use relay_protocol::{TrackInfo, TrackPublished, TrackType};

use super::Receiver;
use crate::error::{Error, Result};
use crate::source::InboundSource;

pub struct MediaTrackParams {
    pub track_info: TrackInfo,
    /// Participant publishing this track
    pub participant_id: String,
}

pub struct MediaTrack {
    /// Captured at construction, never mutated afterwards
    info: TrackInfo,
    participant_id: String,
    source: Arc<dyn InboundSource>,
    /// Set once more than one layer shows up; never cleared
    simulcasted: AtomicBool,
    /// Receivers keyed by SSRC
    receivers: RwLock<HashMap<u32, Arc<Receiver>>>,
}

impl MediaTrack {
    pub fn new(source: Arc<dyn InboundSource>, params: MediaTrackParams) -> Self {
        let MediaTrackParams {
            track_info,
            participant_id,
        } = params;

        Self {
            simulcasted: AtomicBool::new(track_info.simulcast),
            info: track_info,
            participant_id,
            source,
            receivers: RwLock::new(HashMap::new()),
        }
    }

    /// Track SID
    pub fn id(&self) -> &str {
        &self.info.sid
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn kind(&self) -> TrackType {
        self.info.r#type
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Primary inbound source the track was published with
    pub fn source(&self) -> &Arc<dyn InboundSource> {
        &self.source
    }

    pub fn simulcasted(&self) -> bool {
        self.simulcasted.load(Ordering::Acquire)
    }

    /// Record that multiple independently encoded layers are arriving.
    ///
    /// Returns `true` if this call flipped the flag.
    pub fn set_simulcasted(&self) -> bool {
        let flipped = !self.simulcasted.swap(true, Ordering::AcqRel);
        if flipped {
            tracing::info!(
                track = %self.info.sid,
                participant = %self.participant_id,
                "simulcast detected"
            );
        }
        flipped
    }

    /// Descriptor for signaling, reflecting the current simulcast state
    pub fn to_proto(&self) -> TrackInfo {
        TrackInfo {
            simulcast: self.simulcasted(),
            ..self.info.clone()
        }
    }

    pub fn published(&self) -> TrackPublished {
        TrackPublished::Published {
            participant_id: self.participant_id.clone(),
            track: self.to_proto(),
        }
    }

    pub fn unpublished(&self) -> TrackPublished {
        TrackPublished::Unpublished {
            participant_id: self.participant_id.clone(),
            track_sid: self.info.sid.clone(),
        }
    }

    /// Bind a receiver for one layer of this track.
    ///
    /// A second distinct layer marks the track as simulcast.
    pub async fn add_receiver(&self, receiver: Arc<Receiver>) -> Result<()> {
        let ssrc = receiver.ssrc();
        let layers = {
            let mut receivers = self.receivers.write().await;
            if receivers.contains_key(&ssrc) {
                return Err(Error::DuplicateLayer {
                    track_sid: self.info.sid.clone(),
                    ssrc,
                });
            }
            receivers.insert(ssrc, receiver);
            receivers.len()
        };

        tracing::debug!(track = %self.info.sid, ssrc, layers, "bound receiver");

        if layers > 1 {
            self.set_simulcasted();
        }

        Ok(())
    }

    pub async fn receiver(&self, ssrc: u32) -> Option<Arc<Receiver>> {
        self.receivers.read().await.get(&ssrc).cloned()
    }

    pub async fn receivers(&self) -> Vec<Arc<Receiver>> {
        self.receivers.read().await.values().cloned().collect()
    }

    /// Close and release every bound receiver
    pub async fn close(&self) {
        let receivers: Vec<_> = self
            .receivers
            .write()
            .await
            .drain()
            .map(|(_, r)| r)
            .collect();

        for receiver in &receivers {
            receiver.close();
        }

        if !receivers.is_empty() {
            tracing::info!(
                track = %self.info.sid,
                layers = receivers.len(),
                "closed media track"
            );
        }
    }
}
