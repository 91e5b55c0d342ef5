//! Backend-authoritative queue with a local cache.

use crate::client::BackendClient;
use crate::error::Result;
use crate::types::{AddToQueueRequest, MoveEntryRequest, RemoveFromQueueRequest};
use crate::window::QueueWindow;
use cadence_core::QueueEntry;
use reqwest::Method;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the cached queue window and mutates it against the backend.
///
/// Mutations go to the backend first; the local cache only changes through
/// a successful fetch or through `advance_position`.
pub struct QueueClient {
    backend: BackendClient,
    window: Mutex<QueueWindow>,
}

impl QueueClient {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            window: Mutex::new(QueueWindow::new()),
        }
    }

    fn window(&self) -> MutexGuard<'_, QueueWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh the cache from `/queue`.
    ///
    /// An empty answer leaves the cache as it was. On failure the cache is
    /// untouched and the error returned.
    pub async fn fetch_queue(&self) -> Result<Vec<QueueEntry>> {
        let url = self.backend.endpoint(&["queue"])?;

        let entries: Vec<QueueEntry> = match self.backend.get_json(url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to fetch queue, keeping cached entries");
                return Err(e);
            }
        };

        let applied = self.window().replace(entries.clone());
        debug!(
            entries = entries.len(),
            applied,
            current = ?self.current_position(),
            "Fetched queue"
        );

        Ok(entries)
    }

    /// Append a title to the backend queue, then refresh.
    pub async fn enqueue(&self, title: &str) -> Result<()> {
        let url = self.backend.endpoint(&["add_to_queue"])?;
        let body = AddToQueueRequest { song_name: title };

        if let Err(e) = self.backend.send_json(Method::POST, url, &body).await {
            warn!(title = %title, error = %e, "Failed to add to queue");
            return Err(e);
        }

        info!(title = %title, "Added to queue");
        self.fetch_queue().await?;
        Ok(())
    }

    /// Remove the entry at `position` from the backend queue, then refresh.
    pub async fn dequeue(&self, position: i64) -> Result<()> {
        let url = self.backend.endpoint(&["remove_from_queue"])?;
        let body = RemoveFromQueueRequest { position };

        if let Err(e) = self.backend.send_json(Method::DELETE, url, &body).await {
            warn!(position, error = %e, "Failed to remove from queue");
            return Err(e);
        }

        info!(position, "Removed from queue");
        self.fetch_queue().await?;
        Ok(())
    }

    /// Move an entry to another position on the backend, then refresh.
    pub async fn move_entry(&self, from: i64, to: i64) -> Result<()> {
        let url = self.backend.endpoint(&["queue", "move"])?;
        let body = MoveEntryRequest {
            from_position: from,
            to_position: to,
        };

        if let Err(e) = self.backend.send_json(Method::PUT, url, &body).await {
            warn!(from, to, error = %e, "Failed to move queue entry");
            return Err(e);
        }

        info!(from, to, "Moved queue entry");
        self.fetch_queue().await?;
        Ok(())
    }

    /// Point at `position` locally and refresh in the background.
    ///
    /// The trim happens before this returns; the refresh does not block the
    /// caller. Refresh failures are already logged by `fetch_queue`.
    pub fn advance_position(self: &Arc<Self>, position: i64) -> JoinHandle<()> {
        self.window().set_current(position);
        debug!(position, "Advanced queue position");

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _ = this.fetch_queue().await;
        })
    }

    pub fn next_entry(&self) -> Option<QueueEntry> {
        self.window().next_entry().cloned()
    }

    pub fn previous_entry(&self) -> Option<QueueEntry> {
        self.window().previous_entry().cloned()
    }

    pub fn has_next(&self) -> bool {
        self.window().has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.window().has_previous()
    }

    pub fn current_entry(&self) -> Option<QueueEntry> {
        self.window().current_entry().cloned()
    }

    pub fn current_position(&self) -> Option<i64> {
        self.window().current_position()
    }

    /// Snapshot of the cached entries.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.window().entries().to_vec()
    }
}
