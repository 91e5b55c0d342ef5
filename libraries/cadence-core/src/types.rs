//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A playable catalog item with its derived URLs
///
/// Built by the track resolver from backend metadata. The title doubles as
/// the catalog identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Track title (unique within the catalog)
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Backend-relative storage path of the media file
    pub path: String,

    /// Backend-relative path of the artwork (optional)
    pub artwork_path: Option<String>,

    /// URL the device binds to
    pub media_url: String,

    /// URL of the artwork image (optional)
    pub artwork_url: Option<String>,

    /// Duration, unknown until reported
    ///
    /// Seeded from the backend's length hint when it is numeric; the device's
    /// own report takes precedence once a source is bound.
    pub duration: Option<Duration>,
}

/// One slot of the backend queue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Backend position; strictly increasing within a snapshot, gaps allowed
    pub position: i64,

    /// Title of the queued track
    pub title: String,
}

impl QueueEntry {
    /// Create a new queue entry
    pub fn new(position: i64, title: impl Into<String>) -> Self {
        Self {
            position,
            title: title.into(),
        }
    }
}

/// Playback controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track bound
    Idle,

    /// Resolve and buffering in flight
    Loading,

    /// Bound and paused
    Ready,

    /// Currently playing
    Playing,

    /// Device source cleared, new load in flight
    Transitioning,

    /// Resolve or device failure; recoverable
    Error,
}

impl PlaybackState {
    /// Whether a load is in flight and user toggles must be deferred
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Transitioning)
    }

    /// Whether a source is bound and ready for transport commands
    pub fn is_bound(self) -> bool {
        matches!(self, Self::Ready | Self::Playing)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Transitioning => "transitioning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_states() {
        assert!(PlaybackState::Loading.is_busy());
        assert!(PlaybackState::Transitioning.is_busy());
        assert!(!PlaybackState::Ready.is_busy());
        assert!(!PlaybackState::Error.is_busy());
    }

    #[test]
    fn bound_states() {
        assert!(PlaybackState::Ready.is_bound());
        assert!(PlaybackState::Playing.is_bound());
        assert!(!PlaybackState::Idle.is_bound());
        assert!(!PlaybackState::Loading.is_bound());
    }

    #[test]
    fn queue_entry_wire_shape() {
        let entry: QueueEntry =
            serde_json::from_str(r#"{"position": 4, "title": "So What"}"#).unwrap();
        assert_eq!(entry, QueueEntry::new(4, "So What"));
    }
}
