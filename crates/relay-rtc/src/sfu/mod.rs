//! SFU ingestion
//!
//! Receivers pull a publisher's inbound streams and keep their feedback
//! flowing; media tracks group those receivers per publication.

mod media_track;
mod receiver;

pub use media_track::{MediaTrack, MediaTrackParams};
pub use receiver::{Receiver, ReceiverState};
