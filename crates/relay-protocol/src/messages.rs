use serde::{Deserialize, Serialize};

use crate::types::TrackInfo;

/// Track state pushed to signaling whenever a publication changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackPublished {
    /// Track became available (or its descriptor changed)
    Published {
        participant_id: String,
        track: TrackInfo,
    },

    /// Track was unpublished or its publisher left
    Unpublished {
        participant_id: String,
        track_sid: String,
    },
}
