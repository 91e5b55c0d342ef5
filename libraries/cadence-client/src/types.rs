//! Types for Cadence backend requests and responses.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/api";

/// Configuration for connecting to the queue backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL including the API prefix (e.g., "http://127.0.0.1:5000/api")
    pub url: String,

    /// Whole-request timeout
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// TCP connect timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
}

impl BackendConfig {
    /// Create a config for the given base URL with default timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Durations as (fractional) seconds in config files.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

// =============================================================================
// Track Types
// =============================================================================

/// Track metadata as returned by `/song/{title}` and `/random_song`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackRecord {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    /// Seconds as a number, or a placeholder string when unknown
    #[serde(default)]
    pub length: Option<serde_json::Value>,
    pub path: String,
    #[serde(default)]
    pub cover_art: Option<String>,
}

impl TrackRecord {
    /// Provisional duration from the `length` field, when it is a positive number.
    pub fn length_hint(&self) -> Option<Duration> {
        let secs = match self.length.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };

        (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
    }
}

// =============================================================================
// Queue Types
// =============================================================================

/// Request body for `/add_to_queue`.
#[derive(Debug, Serialize)]
pub struct AddToQueueRequest<'a> {
    pub song_name: &'a str,
}

/// Request body for `/remove_from_queue`.
#[derive(Debug, Serialize)]
pub struct RemoveFromQueueRequest {
    pub position: i64,
}

/// Request body for `/queue/move`.
#[derive(Debug, Serialize)]
pub struct MoveEntryRequest {
    pub from_position: i64,
    pub to_position: i64,
}
