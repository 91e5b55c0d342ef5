//! Playback device contract
//!
//! Abstracts the single output the controller drives (an audio element, a
//! network renderer, a headless clock). Commands are async; lifecycle
//! notifications arrive as `DeviceSignal`s on a broadcast channel.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

/// Identifies one `bind` call on a device
///
/// Every signal carries the binding it refers to, so signals that belong to
/// an earlier source can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingId(pub u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding#{}", self.0)
    }
}

/// Lifecycle notifications emitted by a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceSignal {
    /// Source metadata is known
    MetadataReady {
        binding: BindingId,
        duration: Option<Duration>,
    },

    /// Playback position moved
    TimeUpdated {
        binding: BindingId,
        position: Duration,
    },

    /// Enough data is buffered to play to the end without stalling
    CanPlayThrough { binding: BindingId },

    /// Playback reached the end of the source
    Ended { binding: BindingId },

    /// The source failed
    Error { binding: BindingId, message: String },
}

impl DeviceSignal {
    /// Binding this signal refers to
    pub fn binding(&self) -> BindingId {
        match self {
            Self::MetadataReady { binding, .. }
            | Self::TimeUpdated { binding, .. }
            | Self::CanPlayThrough { binding }
            | Self::Ended { binding }
            | Self::Error { binding, .. } => *binding,
        }
    }
}

/// A single playback output
///
/// Implementors must deliver signals for a binding only after `bind` has
/// returned its id or while it is running; callers subscribe before binding.
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    /// Bind a media URL, replacing any previous source
    async fn bind(&self, url: &str) -> Result<BindingId>;

    /// Start or resume playback of the bound source
    async fn play(&self) -> Result<()>;

    /// Pause playback (no-op when nothing is bound)
    async fn pause(&self);

    /// Move the playback position
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Set output level, 0.0 to 1.0
    async fn set_volume(&self, level: f32);

    /// Drop the bound source
    async fn clear(&self);

    /// Release the device for good
    async fn release(&self);

    /// Subscribe to lifecycle signals
    fn subscribe(&self) -> broadcast::Receiver<DeviceSignal>;
}
