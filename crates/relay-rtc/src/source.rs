//! Inbound media sources
//!
//! The receiver never talks to the transport directly. It pulls RTP and RTCP
//! through [`InboundSource`], which the WebRTC stack implements via
//! [`RemoteTrackSource`] and tests implement with in-memory channels.

use async_trait::async_trait;
use std::sync::Arc;
use webrtc::rtcp;
use webrtc::rtp;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// A batch of RTCP packets as produced by a single feedback read
pub type RtcpPackets = Vec<Box<dyn rtcp::packet::Packet + Send + Sync>>;

/// One inbound RTP stream bound to a single SSRC
#[async_trait]
pub trait InboundSource: Send + Sync {
    /// Synchronization source this stream is bound to
    fn ssrc(&self) -> u32;

    fn track_id(&self) -> String;

    /// Block until the next RTP packet arrives or the stream errors
    async fn read_rtp(&self) -> webrtc::error::Result<rtp::packet::Packet>;

    /// Block until the next batch of RTCP feedback arrives or the stream errors
    async fn read_rtcp(&self) -> webrtc::error::Result<RtcpPackets>;
}

/// Whether a read error means the underlying transport was shut down.
///
/// RTCP reads surface a closed SRTP buffer wrapped in interceptor and srtp
/// errors, so the nested variants count as well.
pub fn is_closed_pipe(err: &webrtc::Error) -> bool {
    match err {
        webrtc::Error::ErrClosedPipe => true,
        webrtc::Error::Util(e) => is_closed_buffer(e),
        webrtc::Error::Srtp(e) => is_closed_srtp(e),
        webrtc::Error::Interceptor(e) => is_closed_interceptor(e),
        _ => false,
    }
}

fn is_closed_buffer(err: &webrtc::util::Error) -> bool {
    matches!(err, webrtc::util::Error::ErrBufferClosed)
}

fn is_closed_srtp(err: &webrtc::srtp::Error) -> bool {
    match err {
        webrtc::srtp::Error::ErrStreamAlreadyClosed => true,
        webrtc::srtp::Error::Util(e) => is_closed_buffer(e),
        _ => false,
    }
}

fn is_closed_interceptor(err: &webrtc::interceptor::Error) -> bool {
    match err {
        webrtc::interceptor::Error::Srtp(e) => is_closed_srtp(e),
        webrtc::interceptor::Error::Util(e) => is_closed_buffer(e),
        _ => false,
    }
}

/// Source backed by a negotiated WebRTC remote track
pub struct RemoteTrackSource {
    track: Arc<TrackRemote>,
    receiver: Arc<RTCRtpReceiver>,
}

impl RemoteTrackSource {
    pub fn new(track: Arc<TrackRemote>, receiver: Arc<RTCRtpReceiver>) -> Self {
        Self { track, receiver }
    }
}

#[async_trait]
impl InboundSource for RemoteTrackSource {
    fn ssrc(&self) -> u32 {
        self.track.ssrc()
    }

    fn track_id(&self) -> String {
        self.track.id()
    }

    async fn read_rtp(&self) -> webrtc::error::Result<rtp::packet::Packet> {
        let (packet, _attributes) = self.track.read_rtp().await?;
        Ok(packet)
    }

    async fn read_rtcp(&self) -> webrtc::error::Result<RtcpPackets> {
        let (packets, _attributes) = self.receiver.read_rtcp().await?;
        Ok(packets)
    }
}
