//! Playback Events
//!
//! Event-based communication for keeping a rendering layer in sync.
//! Events are emitted at key points:
//! - State changes (loading, ready, playing, error)
//! - Track changes (when a transition picks its target)
//! - Position updates (forwarded from the device)
//! - Volume and queue changes

use cadence_core::PlaybackState;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Controller state changed
    StateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// A new track became current
    ///
    /// Emitted when loading starts, before the device is ready.
    TrackChanged {
        /// Title of the new track
        title: String,
        /// Title of the track it replaced (if any)
        previous_title: Option<String>,
    },

    /// Position update
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration, once known
        duration_ms: Option<u64>,
    },

    /// Volume changed
    VolumeChanged {
        /// New level (0.0-1.0)
        level: f32,
    },

    /// The backend queue changed through this controller
    QueueChanged {
        /// Number of cached entries after the refresh
        length: usize,
    },

    /// A failure moved the controller into the error state
    Error {
        /// Human-readable message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize() {
        let event = PlaybackEvent::TrackChanged {
            title: "B".to_string(),
            previous_title: Some("A".to_string()),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TrackChanged"));

        let back: PlaybackEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
