//! Feedback errors are only observable through the structured warning log

mod common;

use common::{LogCapture, MockSource, receiver_report, within};
use relay_rtc::{LifetimeScope, Receiver};

const SSRC: u32 = 4242;

#[tokio::test]
async fn test_transient_errors_are_logged_and_skipped() {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    // Current-thread runtime: the pump runs on this thread and sees the default
    let _guard = tracing::subscriber::set_default(subscriber);

    let root = LifetimeScope::root();
    let (source, feed) = MockSource::new(SSRC);
    let receiver = Receiver::new(&root, "PA_publisher", source.clone(), None);
    receiver.start();

    for i in 0..3 {
        feed.rtcp
            .send(Err(webrtc::Error::new(format!("malformed rtcp {i}"))))
            .unwrap();
    }
    feed.rtcp.send(Ok(receiver_report(SSRC))).unwrap();
    drop(feed);

    // Dropped feed surfaces as a closed pipe, which ends the loop quietly
    within(receiver.join()).await;

    assert_eq!(source.rtcp_reads(), 5);
    assert_eq!(receiver.feedback_read(), 1);

    let logs = capture.contents();
    let warnings: Vec<&str> = logs
        .lines()
        .filter(|l| l.contains("WARN") && l.contains("receiver error reading RTCP"))
        .collect();
    assert_eq!(warnings.len(), 3, "logs:\n{logs}");
    for line in &warnings {
        assert!(line.contains("peer=PA_publisher"), "{line}");
        assert!(line.contains("ssrc=4242"), "{line}");
    }
    assert!(warnings[0].contains("malformed rtcp 0"));
}
