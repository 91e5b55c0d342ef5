//! Error types for playback control

use cadence_client::ClientError;
use cadence_core::DeviceError;
use thiserror::Error;

/// Playback errors
///
/// Logged by the controller and turned into state; intents never return them.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Backend request failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Device rejected or failed the source
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A later transition or shutdown made this result stale
    #[error("Transition superseded")]
    Superseded,

    /// No track is bound
    #[error("No track loaded")]
    NoTrack,
}

impl PlaybackError {
    /// Whether this is the expected "a newer load replaced this one" condition
    pub fn is_superseded(&self) -> bool {
        match self {
            Self::Superseded => true,
            Self::Device(e) => e.is_superseded(),
            _ => false,
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_covers_device_condition() {
        assert!(PlaybackError::Superseded.is_superseded());
        assert!(PlaybackError::from(DeviceError::Superseded).is_superseded());
        assert!(!PlaybackError::NoTrack.is_superseded());
        assert!(!PlaybackError::from(ClientError::NotFound("A".into())).is_superseded());
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err = PlaybackError::from(ClientError::NotFound("A".into()));
        assert_eq!(err.to_string(), "Track not found: A");
    }
}
