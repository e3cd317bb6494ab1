//! Shared helpers for the relay-rtc integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use relay_rtc::RtcpPackets;
use relay_rtc::source::InboundSource;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing_subscriber::fmt::MakeWriter;
use webrtc::rtcp::receiver_report::ReceiverReport;
use webrtc::rtp::header::Header;
use webrtc::rtp::packet::Packet;

type RtpResult = webrtc::error::Result<Packet>;
type RtcpResult = webrtc::error::Result<RtcpPackets>;

/// In-memory source fed through channels. Dropping the feeding side makes
/// the corresponding reads fail with a closed pipe.
pub struct MockSource {
    ssrc: u32,
    rtp: Mutex<mpsc::UnboundedReceiver<RtpResult>>,
    rtcp: Mutex<mpsc::UnboundedReceiver<RtcpResult>>,
    rtcp_reads: AtomicUsize,
}

pub struct MockFeed {
    pub rtp: mpsc::UnboundedSender<RtpResult>,
    pub rtcp: mpsc::UnboundedSender<RtcpResult>,
}

impl MockSource {
    pub fn new(ssrc: u32) -> (Arc<Self>, MockFeed) {
        let (rtp_tx, rtp_rx) = mpsc::unbounded_channel();
        let (rtcp_tx, rtcp_rx) = mpsc::unbounded_channel();
        let source = Arc::new(Self {
            ssrc,
            rtp: Mutex::new(rtp_rx),
            rtcp: Mutex::new(rtcp_rx),
            rtcp_reads: AtomicUsize::new(0),
        });
        let feed = MockFeed {
            rtp: rtp_tx,
            rtcp: rtcp_tx,
        };
        (source, feed)
    }

    /// Number of feedback reads issued so far, including one in flight
    pub fn rtcp_reads(&self) -> usize {
        self.rtcp_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InboundSource for MockSource {
    fn ssrc(&self) -> u32 {
        self.ssrc
    }

    fn track_id(&self) -> String {
        format!("mock-{}", self.ssrc)
    }

    async fn read_rtp(&self) -> RtpResult {
        self.rtp
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(Err(webrtc::Error::ErrClosedPipe))
    }

    async fn read_rtcp(&self) -> RtcpResult {
        self.rtcp_reads.fetch_add(1, Ordering::SeqCst);
        self.rtcp
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(Err(webrtc::Error::ErrClosedPipe))
    }
}

pub fn rtp_packet(ssrc: u32, sequence_number: u16, timestamp: u32) -> Packet {
    Packet {
        header: Header {
            version: 2,
            payload_type: 96,
            ssrc,
            sequence_number,
            timestamp,
            ..Default::default()
        },
        payload: vec![0xAB; 20].into(),
    }
}

pub fn receiver_report(ssrc: u32) -> RtcpPackets {
    let report: Box<dyn webrtc::rtcp::packet::Packet + Send + Sync> = Box::new(ReceiverReport {
        ssrc,
        ..Default::default()
    });
    vec![report]
}

/// Poll `check` until it holds or a second passes
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("operation timed out")
}

/// Collects formatted log output for assertions
#[derive(Clone, Default)]
pub struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
