use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix used for server-assigned track identifiers
pub const TRACK_ID_PREFIX: &str = "TR_";

/// Where a published track originates on the publisher's device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    #[default]
    Unknown,
    Camera,
    Microphone,
    ScreenShare,
    ScreenShareAudio,
}

/// Media kind of a published track
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    Video,
    Data,
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackType::Audio => write!(f, "audio"),
            TrackType::Video => write!(f, "video"),
            TrackType::Data => write!(f, "data"),
        }
    }
}

/// Track descriptor as persisted for a publication and sent to signaling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackInfo {
    pub sid: String,
    pub name: String,
    #[serde(default)]
    pub source: TrackSource,
    #[serde(rename = "type")]
    pub r#type: TrackType,
    #[serde(default)]
    pub simulcast: bool,
    /// Only meaningful for video
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub muted: bool,
}

impl TrackInfo {
    /// Create a descriptor with a freshly minted track identifier
    pub fn new(name: impl Into<String>, source: TrackSource, r#type: TrackType) -> Self {
        Self {
            sid: new_track_id(),
            name: name.into(),
            source,
            r#type,
            simulcast: false,
            width: 0,
            height: 0,
            muted: false,
        }
    }

    pub fn is_video(&self) -> bool {
        self.r#type == TrackType::Video
    }
}

/// Mint a new track identifier (`TR_` followed by a simple UUID)
pub fn new_track_id() -> String {
    format!("{}{}", TRACK_ID_PREFIX, Uuid::new_v4().simple())
}
