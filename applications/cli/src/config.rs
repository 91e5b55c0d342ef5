/// Player configuration
use crate::error::{CliError, Result};
use cadence_client::BackendConfig;
use cadence_playback::{PlaybackConfig, DEFAULT_RESTART_THRESHOLD, DEFAULT_SETTLE_DELAY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

/// Environment override prefix (`CADENCE_BACKEND__URL`, `CADENCE_LOG_FILTER`, ...)
pub const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Start playing as soon as the first track is ready
    #[serde(default)]
    pub autoplay: bool,
}

/// Controller tunables; durations are (fractional) seconds, like the
/// backend timeouts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_settle_delay")]
    pub settle_delay: f64,

    #[serde(default = "default_restart_threshold")]
    pub restart_threshold: f64,

    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// No limit when unset
    #[serde(default)]
    pub ready_timeout: Option<f64>,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            restart_threshold: default_restart_threshold(),
            initial_volume: default_initial_volume(),
            ready_timeout: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl PlaybackSettings {
    /// Convert to the controller config; invalid durations fall back to
    /// the defaults (`validate` rejects them first)
    pub fn to_playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            settle_delay: secs(self.settle_delay).unwrap_or(DEFAULT_SETTLE_DELAY),
            restart_threshold: secs(self.restart_threshold).unwrap_or(DEFAULT_RESTART_THRESHOLD),
            initial_volume: self.initial_volume,
            ready_timeout: self.ready_timeout.and_then(secs),
            event_capacity: self.event_capacity,
        }
    }
}

fn secs(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            playback: PlaybackSettings::default(),
            log_filter: default_log_filter(),
            autoplay: false,
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` is read when
    /// present. `CADENCE_`-prefixed variables override the file, with `__`
    /// separating nested keys.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like `load`, reading overrides from `env` instead of the process
    /// environment when given
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.backend.url.trim();
        if url.is_empty() {
            return Err(CliError::Config(
                "Backend URL is required (set CADENCE_BACKEND__URL)".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CliError::Config(format!(
                "Backend URL must start with http:// or https://, got {:?}",
                url
            )));
        }

        let volume = self.playback.initial_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(CliError::Config(format!(
                "Initial volume must be between 0.0 and 1.0, got {}",
                volume
            )));
        }

        let durations = [
            ("settle_delay", Some(self.playback.settle_delay)),
            ("restart_threshold", Some(self.playback.restart_threshold)),
            ("ready_timeout", self.playback.ready_timeout),
        ];
        for (name, value) in durations {
            if let Some(value) = value {
                if secs(value).is_none() {
                    return Err(CliError::Config(format!(
                        "playback.{} must be a non-negative number of seconds, got {}",
                        name, value
                    )));
                }
            }
        }

        if self.playback.event_capacity == 0 {
            return Err(CliError::Config(
                "Event capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_log_filter() -> String {
    "cadence=info,cadence_cli=info,cadence_playback=info,cadence_client=info".to_string()
}

fn default_settle_delay() -> f64 {
    DEFAULT_SETTLE_DELAY.as_secs_f64()
}

fn default_restart_threshold() -> f64 {
    DEFAULT_RESTART_THRESHOLD.as_secs_f64()
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_event_capacity() -> usize {
    64
}
