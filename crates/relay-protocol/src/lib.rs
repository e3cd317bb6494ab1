//! Shared protocol definitions for the relay media core
//!
//! These are the wire-level shapes handed to signaling. Nothing in here
//! depends on the media stack.

pub mod messages;
pub mod types;

pub use messages::TrackPublished;
pub use types::{TrackInfo, TrackSource, TrackType};
