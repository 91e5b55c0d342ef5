//! Controller configuration and result types

use cadence_core::{PlaybackState, Track};
use serde::Serialize;
use std::time::Duration;

/// Pause between tearing down the old source and binding the new one
///
/// Signals the device emits for the old binding while it unwinds (a late
/// time update, an abort error) must drain before the new source is bound,
/// or they are read as belonging to it.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Elapsed time beyond which "previous" restarts the current track
pub const DEFAULT_RESTART_THRESHOLD: Duration = Duration::from_secs(2);

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Wait between teardown and rebind (default: 100ms)
    pub settle_delay: Duration,

    /// "Previous" restarts instead of navigating past this point (default: 2s)
    pub restart_threshold: Duration,

    /// Initial volume (0.0-1.0, default: 1.0)
    pub initial_volume: f32,

    /// Limit on the wait for a bound source to become ready (default: none)
    pub ready_timeout: Option<Duration>,

    /// Capacity of the event broadcast channel (default: 64)
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
            initial_volume: 1.0,
            ready_timeout: None,
            event_capacity: 64,
        }
    }
}

/// How a navigation request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionOutcome {
    /// A new track is bound and ready (and playing, if intended)
    Completed,

    /// The current track was rewound to zero
    Restarted,

    /// Another transition was in flight; nothing happened
    Dropped,

    /// The controller moved on while this transition was suspended
    Superseded,

    /// Resolution or device preparation failed; the controller is in `Error`
    Failed,

    /// Nothing to navigate to
    NoOp,
}

/// Read-only view of the session for a rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub track: Option<Track>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_loading: bool,
    pub current_time: Duration,
    pub duration: Option<Duration>,
    pub volume: f32,
    pub transition_in_progress: bool,
    pub queue_position: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.settle_delay, Duration::from_millis(100));
        assert_eq!(config.restart_threshold, Duration::from_secs(2));
        assert_eq!(config.initial_volume, 1.0);
        assert!(config.ready_timeout.is_none());
        assert_eq!(config.event_capacity, 64);
    }
}
