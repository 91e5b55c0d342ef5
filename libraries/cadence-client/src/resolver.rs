//! Track resolution and device preparation.

use crate::client::{is_not_found_status, BackendClient};
use crate::error::{ClientError, Result};
use crate::types::TrackRecord;
use cadence_core::{BindingId, DeviceError, DeviceSignal, PlaybackDevice, Track};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Resolves catalog titles into playable tracks.
#[derive(Debug, Clone)]
pub struct TrackResolver {
    backend: BackendClient,
}

impl TrackResolver {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Fetch metadata for `title` and derive its URLs.
    ///
    /// A 404 maps to `ClientError::NotFound`; the caller falls back to
    /// `random_track`.
    pub async fn resolve(&self, title: &str) -> Result<Track> {
        let url = self.backend.endpoint(&["song", title])?;

        let record: TrackRecord = self.backend.get_json(url).await.map_err(|e| {
            if is_not_found_status(&e) {
                ClientError::NotFound(title.to_string())
            } else {
                e
            }
        })?;

        let track = self.to_track(record)?;
        debug!(title = %track.title, url = %track.media_url, "Resolved track");
        Ok(track)
    }

    /// Fetch an arbitrary catalog track.
    pub async fn random_track(&self) -> Result<Track> {
        let url = self.backend.endpoint(&["random_song"])?;

        let record: TrackRecord = self.backend.get_json(url).await.map_err(|e| {
            if is_not_found_status(&e) {
                ClientError::NotFound("random track (catalog is empty)".into())
            } else {
                e
            }
        })?;

        let track = self.to_track(record)?;
        debug!(title = %track.title, "Picked random track");
        Ok(track)
    }

    fn to_track(&self, record: TrackRecord) -> Result<Track> {
        let duration = record.length_hint();

        let media_file = file_name(&record.path)
            .ok_or_else(|| ClientError::ParseError(format!("track path is empty: {:?}", record.path)))?;
        let media_url = self.backend.endpoint(&["audio", media_file])?.to_string();

        let artwork_url = match record.cover_art.as_deref().and_then(file_name) {
            Some(file) => Some(self.backend.endpoint(&["cover_art", file])?.to_string()),
            None => None,
        };

        Ok(Track {
            title: record.title,
            artist: record.artist,
            album: record.album,
            path: record.path,
            artwork_path: record.cover_art,
            media_url,
            artwork_url,
            duration,
        })
    }
}

/// Final segment of a backend path, which may use either separator.
fn file_name(path: &str) -> Option<&str> {
    path.rsplit(|c| c == '/' || c == '\\')
        .next()
        .filter(|name| !name.is_empty())
}

/// A track bound on a device and ready to play through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedTrack {
    pub binding: BindingId,
    /// Duration reported by the device while loading, if any
    pub duration: Option<Duration>,
}

/// Bind `track` on `device` and wait until it can play through.
///
/// Subscribes before binding so no signal for the new binding is missed.
/// Signals from older bindings are skipped; a signal from a newer binding
/// means someone else rebound the device, reported as `Superseded`. With no
/// `ready_timeout` the wait is bounded only by the device's own signals.
pub async fn prepare_for_playback(
    device: &dyn PlaybackDevice,
    track: &Track,
    ready_timeout: Option<Duration>,
) -> std::result::Result<PreparedTrack, DeviceError> {
    let mut signals = device.subscribe();
    let binding = device.bind(&track.media_url).await?;
    debug!(title = %track.title, %binding, "Bound track, waiting for device");

    let wait = async {
        let mut duration = None;
        loop {
            let signal = match signals.recv().await {
                Ok(signal) => signal,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, %binding, "Device signals lagged while preparing");
                    continue;
                }
                Err(RecvError::Closed) => return Err(DeviceError::Disconnected),
            };

            if signal.binding() < binding {
                continue;
            }
            if signal.binding() > binding {
                return Err(DeviceError::Superseded);
            }

            match signal {
                DeviceSignal::MetadataReady { duration: d, .. } => duration = d.or(duration),
                DeviceSignal::CanPlayThrough { .. } => {
                    return Ok(PreparedTrack { binding, duration });
                }
                DeviceSignal::Error { message, .. } => return Err(DeviceError::Load(message)),
                DeviceSignal::TimeUpdated { .. } | DeviceSignal::Ended { .. } => {}
            }
        }
    };

    match ready_timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| DeviceError::Timeout(limit))?,
        None => wait.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_handles_both_separators() {
        assert_eq!(file_name("Artist\\Album\\01 Intro.mp3"), Some("01 Intro.mp3"));
        assert_eq!(file_name("/srv/cover_art/Kind of Blue.jpg"), Some("Kind of Blue.jpg"));
        assert_eq!(file_name("plain.mp3"), Some("plain.mp3"));
        assert_eq!(file_name("dir/"), None);
        assert_eq!(file_name(""), None);
    }
}
