//! Cadence Backend Client
//!
//! HTTP client library for the queue backend that feeds the playback
//! controller.
//!
//! # Features
//!
//! - **Queue**: cached, backend-authoritative queue window with a navigation pointer
//! - **Tracks**: metadata resolution and media/artwork URL derivation
//! - **Preparation**: bind a track on a `PlaybackDevice` and await readiness
//!
//! # Example
//!
//! ```ignore
//! use cadence_client::{BackendClient, BackendConfig, QueueClient, TrackResolver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = BackendClient::new(BackendConfig::default())?;
//!     let queue = Arc::new(QueueClient::new(backend.clone()));
//!     let resolver = TrackResolver::new(backend);
//!
//!     queue.fetch_queue().await?;
//!     if let Some(next) = queue.next_entry() {
//!         let track = resolver.resolve(&next.title).await?;
//!         println!("Up next: {} ({})", track.title, track.media_url);
//!         queue.advance_position(next.position);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod queue;
mod resolver;
mod types;
mod window;

pub use client::BackendClient;
pub use error::{ClientError, Result};
pub use queue::QueueClient;
pub use resolver::{prepare_for_playback, PreparedTrack, TrackResolver};
pub use types::{BackendConfig, TrackRecord, DEFAULT_BACKEND_URL};
pub use window::QueueWindow;
