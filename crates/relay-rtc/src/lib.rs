//! Relay RTC
//!
//! Media ingestion core of the relay SFU. A [`sfu::Receiver`] owns one
//! inbound RTP stream and pumps its RTCP feedback in the background, while a
//! [`sfu::MediaTrack`] groups the receivers of one published track (one per
//! simulcast layer) and renders the track descriptor sent to signaling.

pub mod buffer;
pub mod config;
pub mod error;
pub mod scope;
pub mod sfu;
pub mod source;
pub mod telemetry;

pub use buffer::{PacketHistory, RetentionBuffer};
pub use crate::config::Config;
pub use error::{Error, Result};
pub use scope::LifetimeScope;
pub use sfu::{MediaTrack, MediaTrackParams, Receiver, ReceiverState};
pub use source::{InboundSource, RemoteTrackSource, RtcpPackets};
