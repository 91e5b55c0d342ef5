//! Playback history tracking
//!
//! Records tracks that were actually played, for "previous" navigation

use cadence_core::Track;

/// Append-only record of played tracks with a backward-navigation cursor
///
/// Entries are never removed. Stepping back only moves the cursor; the next
/// append puts the cursor back at the tail.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Played tracks (oldest first)
    tracks: Vec<Track>,

    /// Index of the entry currently being played, if any
    cursor: Option<usize>,
}

impl History {
    /// Create empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a track and move the cursor to it
    pub fn append(&mut self, track: Track) {
        self.tracks.push(track);
        self.cursor = Some(self.tracks.len() - 1);
    }

    /// Move the cursor back one entry and return that entry
    ///
    /// Returns `None` (and leaves the cursor alone) at the oldest entry.
    pub fn step_back(&mut self) -> Option<Track> {
        let cursor = self.cursor.filter(|c| *c > 0)? - 1;
        self.cursor = Some(cursor);
        self.tracks.get(cursor).cloned()
    }

    /// Whether `step_back` would return a track
    pub fn can_step_back(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor?)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// All recorded tracks (oldest first)
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            artist: "Test Artist".to_string(),
            album: Some("Test Album".to_string()),
            path: format!("{}.mp3", title),
            artwork_path: None,
            media_url: format!("http://localhost/api/audio/{}.mp3", title),
            artwork_url: None,
            duration: None,
        }
    }

    #[test]
    fn create_history() {
        let history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(!history.can_step_back());
    }

    #[test]
    fn append_moves_cursor_to_tail() {
        let mut history = History::new();
        history.append(create_test_track("A"));
        history.append(create_test_track("B"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(history.current().map(|t| t.title.as_str()), Some("B"));
    }

    #[test]
    fn step_back_walks_towards_oldest() {
        let mut history = History::new();
        history.append(create_test_track("A"));
        history.append(create_test_track("B"));
        history.append(create_test_track("C"));

        assert_eq!(history.step_back().map(|t| t.title), Some("B".to_string()));
        assert_eq!(history.step_back().map(|t| t.title), Some("A".to_string()));
        assert!(history.step_back().is_none());
        assert_eq!(history.cursor(), Some(0));

        // Nothing is discarded
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn single_entry_cannot_step_back() {
        let mut history = History::new();
        history.append(create_test_track("A"));

        assert!(!history.can_step_back());
        assert!(history.step_back().is_none());
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn append_after_step_back_returns_to_tail() {
        let mut history = History::new();
        history.append(create_test_track("A"));
        history.append(create_test_track("B"));
        history.step_back();

        history.append(create_test_track("C"));

        let titles: Vec<_> = history.tracks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(history.cursor(), Some(2));
        assert!(history.can_step_back());
    }

    mod property {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// `true` appends, `false` steps back
            #[test]
            fn cursor_stays_in_bounds(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
                let mut history = History::new();
                let mut appended = 0usize;

                for append in ops {
                    if append {
                        history.append(create_test_track(&appended.to_string()));
                        appended += 1;
                        prop_assert_eq!(history.cursor(), Some(appended - 1));
                    } else {
                        let before = history.cursor();
                        let stepped = history.step_back();
                        prop_assert_eq!(stepped.is_some(), before.is_some_and(|c| c > 0));
                    }

                    prop_assert_eq!(history.len(), appended);
                    if let Some(cursor) = history.cursor() {
                        prop_assert!(cursor < history.len());
                    }
                }
            }
        }
    }
}
