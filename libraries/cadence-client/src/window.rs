//! Sliding window over the backend queue.

use cadence_core::QueueEntry;

/// Locally cached slice of the backend queue plus the navigation pointer.
///
/// Invariants held after every mutation:
/// - entries are sorted ascending by position
/// - no entry sits before the current position
///
/// Entries behind the pointer are pruned, so this is a window onto the
/// remaining queue rather than a mirror of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueWindow {
    entries: Vec<QueueEntry>,
    current: Option<i64>,
}

impl QueueWindow {
    /// Create an empty, uninitialized window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached entries with a fresh snapshot.
    ///
    /// An empty snapshot is ignored and the prior cache kept. Returns whether
    /// the snapshot was applied.
    pub fn replace(&mut self, mut entries: Vec<QueueEntry>) -> bool {
        if entries.is_empty() {
            return false;
        }

        entries.sort_by_key(|e| e.position);
        entries.dedup_by_key(|e| e.position);

        if self.current.is_none() {
            self.current = Some(entries[0].position);
        }
        self.entries = entries;
        self.trim();
        true
    }

    /// Move the navigation pointer and prune everything behind it.
    pub fn set_current(&mut self, position: i64) {
        self.current = Some(position);
        self.trim();
    }

    fn trim(&mut self) {
        if let Some(current) = self.current {
            self.entries.retain(|e| e.position >= current);
        }
    }

    fn current_index(&self) -> Option<usize> {
        let current = self.current?;
        self.entries.iter().position(|e| e.position == current)
    }

    /// Entry after the current one, by index in the cache.
    pub fn next_entry(&self) -> Option<&QueueEntry> {
        let index = self.current_index()?;
        self.entries.get(index + 1)
    }

    /// Entry before the current one, by index in the cache.
    pub fn previous_entry(&self) -> Option<&QueueEntry> {
        let index = self.current_index()?;
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn has_next(&self) -> bool {
        self.next_entry().is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_entry().is_some()
    }

    /// Entry at the current position, if cached.
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.current_index().map(|i| &self.entries[i])
    }

    pub fn current_position(&self) -> Option<i64> {
        self.current
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
