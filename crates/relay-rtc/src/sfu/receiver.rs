//! Receiver for a single inbound RTP stream
//!
//! Owns one bound source. RTP is pulled by exactly one forwarding loop via
//! [`Receiver::read_rtp`]; RTCP feedback is drained by a background task
//! started once through [`Receiver::start`].

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use webrtc::rtp::packet::Packet;
use webrtc::util::MarshalSize;

use crate::buffer::RetentionBuffer;
use crate::scope::LifetimeScope;
use crate::source::{is_closed_pipe, InboundSource};

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Lifecycle of a receiver. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    Running,
    Closed,
}

pub struct Receiver {
    peer_id: String,
    scope: LifetimeScope,
    source: Arc<dyn InboundSource>,
    /// `None` means buffering is not configured for this stream
    buffer: Option<Arc<dyn RetentionBuffer>>,
    state: AtomicU8,
    worker: Mutex<Option<JoinHandle<()>>>,
    packets_read: AtomicU64,
    bytes_read: AtomicU64,
    feedback_read: Arc<AtomicU64>,
}

impl Receiver {
    /// Create a receiver whose lifetime is bounded by `parent`
    pub fn new(
        parent: &LifetimeScope,
        peer_id: impl Into<String>,
        source: Arc<dyn InboundSource>,
        buffer: Option<Arc<dyn RetentionBuffer>>,
    ) -> Self {
        Self {
            peer_id: peer_id.into(),
            scope: parent.child(),
            source,
            buffer,
            state: AtomicU8::new(STATE_IDLE),
            worker: Mutex::new(None),
            packets_read: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            feedback_read: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn track_id(&self) -> String {
        self.source.track_id()
    }

    /// SSRC of the bound source
    pub fn ssrc(&self) -> u32 {
        self.source.ssrc()
    }

    pub fn state(&self) -> ReceiverState {
        if self.scope.is_cancelled() {
            return ReceiverState::Closed;
        }
        match self.state.load(Ordering::Acquire) {
            STATE_IDLE => ReceiverState::Idle,
            STATE_RUNNING => ReceiverState::Running,
            _ => ReceiverState::Closed,
        }
    }

    pub fn packets_read(&self) -> u64 {
        self.packets_read.load(Ordering::Relaxed)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Number of RTCP batches the feedback pump has consumed
    pub fn feedback_read(&self) -> u64 {
        self.feedback_read.load(Ordering::Relaxed)
    }

    /// Start the RTCP feedback pump.
    ///
    /// Only the first call spawns the worker; later or concurrent calls, and
    /// calls after close, do nothing. Must be called within a Tokio runtime.
    pub fn start(&self) {
        if self.scope.is_cancelled() {
            return;
        }
        if self
            .state
            .compare_exchange(STATE_IDLE, STATE_RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let pump = FeedbackPump {
            peer_id: self.peer_id.clone(),
            scope: self.scope.clone(),
            source: self.source.clone(),
            buffer: self.buffer.clone(),
            feedback_read: self.feedback_read.clone(),
        };
        let handle = tokio::spawn(pump.run());

        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

        tracing::debug!(peer = %self.peer_id, ssrc = self.ssrc(), "receiver started");
    }

    /// Close the receiver. Safe to call any number of times, started or not.
    ///
    /// This does not interrupt a `read_rtp` already in flight; the forwarding
    /// loop stops once the source errors out.
    pub fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::Release);
        if self.scope.cancel() {
            tracing::debug!(peer = %self.peer_id, ssrc = self.ssrc(), "receiver closed");
        }
    }

    /// Wait for the feedback pump to finish, if it was ever started
    pub async fn join(&self) {
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(
                    peer = %self.peer_id,
                    ssrc = self.ssrc(),
                    error = %e,
                    "feedback worker panicked"
                );
            }
        }
    }

    /// Pull the next RTP packet from the source.
    ///
    /// Only one task may call this for the lifetime of the receiver. Source
    /// errors are returned as-is.
    pub async fn read_rtp(&self) -> webrtc::error::Result<Packet> {
        let packet = self.source.read_rtp().await?;

        self.packets_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read
            .fetch_add(packet.marshal_size() as u64, Ordering::Relaxed);

        if let Some(buffer) = &self.buffer {
            buffer.record_rtp(self.ssrc(), &packet);
        }

        Ok(packet)
    }

    /// Retained packets for a NACK, rewritten for the subscriber stream.
    ///
    /// Always empty when no retention buffer is configured.
    pub fn get_buffered_packets(
        &self,
        media_ssrc: u32,
        sn_offset: u16,
        ts_offset: u32,
        sequence_numbers: &[u16],
    ) -> Vec<Packet> {
        match &self.buffer {
            None => Vec::new(),
            Some(buffer) => buffer.get_buffered_packets(
                self.ssrc(),
                media_ssrc,
                sn_offset,
                ts_offset,
                sequence_numbers,
            ),
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

struct FeedbackPump {
    peer_id: String,
    scope: LifetimeScope,
    source: Arc<dyn InboundSource>,
    buffer: Option<Arc<dyn RetentionBuffer>>,
    feedback_read: Arc<AtomicU64>,
}

impl FeedbackPump {
    async fn run(self) {
        let ssrc = self.source.ssrc();

        loop {
            let result = tokio::select! {
                biased;
                _ = self.scope.cancelled() => return,
                result = self.source.read_rtcp() => result,
            };

            if self.scope.is_cancelled() {
                return;
            }

            match result {
                Ok(packets) => {
                    self.feedback_read.fetch_add(1, Ordering::Relaxed);
                    if let Some(buffer) = &self.buffer {
                        buffer.record_feedback(ssrc, &packets);
                    }
                }
                Err(e) if is_closed_pipe(&e) => {
                    tracing::debug!(peer = %self.peer_id, ssrc, "feedback source closed");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        peer = %self.peer_id,
                        ssrc,
                        error = %e,
                        "receiver error reading RTCP"
                    );
                    tokio::task::yield_now().await;
                }
            }
        }
    }
}
