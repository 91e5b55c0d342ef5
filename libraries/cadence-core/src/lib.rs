//! Cadence Player Core
//!
//! Platform-agnostic core types and the playback device contract shared by
//! the backend client and the playback controller.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `QueueEntry`, `PlaybackState`
//! - **Device Contract**: the `PlaybackDevice` trait and the `DeviceSignal`s it emits
//! - **Error Handling**: `DeviceError` for everything a device can reject
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{QueueEntry, PlaybackState};
//!
//! let entry = QueueEntry::new(1, "Blue in Green");
//! assert_eq!(entry.position, 1);
//! assert!(!PlaybackState::Idle.is_busy());
//! ```

#![forbid(unsafe_code)]

pub mod device;
pub mod error;
pub mod types;

pub use device::{BindingId, DeviceSignal, PlaybackDevice};
pub use error::{DeviceError, Result};
pub use types::{PlaybackState, QueueEntry, Track};
