//! Cadence Player - Playback Control
//!
//! Keeps a single playback device in step with a backend-owned queue.
//!
//! This crate provides:
//! - Single-flight track transitions (next, previous, auto-advance on end)
//! - Local history for backward navigation
//! - Play/pause intent reconciliation across asynchronous loads
//! - Event broadcasting for a rendering layer
//!
//! # Architecture
//!
//! `cadence-playback` is device-agnostic: the output is any
//! `cadence_core::PlaybackDevice`, the queue and track metadata come from
//! `cadence-client`. Nothing here renders anything; a UI or command loop
//! issues intents and reads `PlaybackSnapshot`s.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_client::{BackendClient, BackendConfig, QueueClient, TrackResolver};
//! use cadence_core::PlaybackDevice;
//! use cadence_playback::{PlaybackConfig, PlaybackController};
//! use std::sync::Arc;
//!
//! async fn run(device: Arc<dyn PlaybackDevice>) -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = BackendClient::new(BackendConfig::default())?;
//!     let queue = Arc::new(QueueClient::new(backend.clone()));
//!     let resolver = TrackResolver::new(backend);
//!
//!     let controller = PlaybackController::new(PlaybackConfig::default(), queue, resolver, device);
//!     controller.spawn_signal_loop();
//!
//!     controller.start().await;
//!     controller.toggle_play().await;
//!     controller.request_next().await;
//!
//!     let snapshot = controller.snapshot();
//!     println!("{:?} playing={}", snapshot.track.map(|t| t.title), snapshot.is_playing);
//!
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod error;
pub mod events;
mod guard;
pub mod history;
pub mod types;

pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use history::History;
pub use types::{
    PlaybackConfig, PlaybackSnapshot, TransitionOutcome, DEFAULT_RESTART_THRESHOLD,
    DEFAULT_SETTLE_DELAY,
};
