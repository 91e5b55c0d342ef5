/// Device error types for Cadence Player
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `DeviceError`
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors a playback device can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device refused to bind the given source
    #[error("Failed to bind source: {0}")]
    Bind(String),

    /// The bound source failed while loading or playing
    #[error("Source failed to load: {0}")]
    Load(String),

    /// The device rejected a play attempt
    #[error("Play rejected: {0}")]
    Rejected(String),

    /// The operation was interrupted by a later load
    #[error("Operation superseded by a later load")]
    Superseded,

    /// No ready signal arrived within the configured limit
    #[error("Source not ready after {0:?}")]
    Timeout(Duration),

    /// The device stopped delivering signals
    #[error("Device disconnected")]
    Disconnected,
}

impl DeviceError {
    /// Create a bind error
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a play rejection
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Whether this is the expected "a newer load replaced this one" condition
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}
