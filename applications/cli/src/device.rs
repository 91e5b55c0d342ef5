//! Headless playback device
//!
//! Drives the controller end to end without an audio output: a bind
//! downloads the media and probes it, playback is a clock.

use async_trait::async_trait;
use cadence_core::{BindingId, DeviceError, DeviceSignal, PlaybackDevice};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Interval between position updates while playing
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Default)]
struct Clock {
    binding: Option<BindingId>,
    ready: bool,
    duration: Option<Duration>,
    position: Duration,
    playing: bool,
    volume: f32,
    released: bool,
    loader: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl Clock {
    fn stop_tasks(&mut self) {
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// A `PlaybackDevice` that decodes nothing and plays silence on a timer
///
/// Readiness follows a full download of the media plus a successful probe;
/// the probed duration decides when `Ended` fires. A source with no known
/// duration plays until paused or cleared.
pub struct HeadlessDevice {
    http: reqwest::Client,
    signals: broadcast::Sender<DeviceSignal>,
    next_binding: AtomicU64,
    clock: Arc<Mutex<Clock>>,
    tick: Duration,
}

impl HeadlessDevice {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_tick(http, DEFAULT_TICK)
    }

    pub fn with_tick(http: reqwest::Client, tick: Duration) -> Self {
        let (signals, _) = broadcast::channel(128);
        Self {
            http,
            signals,
            next_binding: AtomicU64::new(0),
            clock: Arc::new(Mutex::new(Clock {
                volume: 1.0,
                ..Clock::default()
            })),
            tick,
        }
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        lock(&self.clock)
    }

    /// Current output level
    pub fn volume(&self) -> f32 {
        self.clock().volume
    }

    fn spawn_loader(&self, binding: BindingId, url: String) -> JoinHandle<()> {
        let http = self.http.clone();
        let signals = self.signals.clone();
        let clock = Arc::clone(&self.clock);

        tokio::spawn(async move {
            let result = fetch_and_probe(&http, &url).await;

            let still_bound = lock(&clock).binding == Some(binding);
            if !still_bound {
                debug!(%binding, "Binding replaced while loading");
                return;
            }

            match result {
                Ok(duration) => {
                    {
                        let mut clock = lock(&clock);
                        clock.ready = true;
                        clock.duration = duration;
                    }
                    debug!(%binding, ?duration, "Source ready");
                    let _ = signals.send(DeviceSignal::MetadataReady { binding, duration });
                    let _ = signals.send(DeviceSignal::CanPlayThrough { binding });
                }
                Err(message) => {
                    warn!(%binding, url = %url, error = %message, "Source failed to load");
                    let _ = signals.send(DeviceSignal::Error { binding, message });
                }
            }
        })
    }

    fn spawn_ticker(&self, binding: BindingId) -> JoinHandle<()> {
        let signals = self.signals.clone();
        let clock = Arc::clone(&self.clock);
        let tick = self.tick;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;

            loop {
                interval.tick().await;

                let signal = {
                    let mut clock = lock(&clock);
                    if clock.binding != Some(binding) || !clock.playing {
                        break;
                    }

                    clock.position += tick;
                    match clock.duration {
                        Some(duration) if clock.position >= duration => {
                            clock.position = duration;
                            clock.playing = false;
                            clock.ticker = None;
                            DeviceSignal::Ended { binding }
                        }
                        _ => DeviceSignal::TimeUpdated {
                            binding,
                            position: clock.position,
                        },
                    }
                };

                let ended = matches!(signal, DeviceSignal::Ended { .. });
                let _ = signals.send(signal);
                if ended {
                    break;
                }
            }
        })
    }
}

fn lock(clock: &Mutex<Clock>) -> MutexGuard<'_, Clock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Download the whole source and read its duration
async fn fetch_and_probe(
    http: &reqwest::Client,
    url: &str,
) -> std::result::Result<Option<Duration>, String> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| format!("download failed: {}", e))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("download failed: {}", e))?;

    let extension = url
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    tokio::task::spawn_blocking(move || probe_duration(bytes.to_vec(), extension.as_deref()))
        .await
        .map_err(|e| format!("probe task failed: {}", e))?
}

/// Probe an in-memory source; `Ok(None)` when the container does not say
fn probe_duration(
    bytes: Vec<u8>,
    extension: Option<&str>,
) -> std::result::Result<Option<Duration>, String> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("unsupported media: {}", e))?;

    let Some(track) = probed.format.default_track() else {
        return Err("no playable track".to_string());
    };
    let params = &track.codec_params;

    let duration = match (params.time_base, params.n_frames, params.sample_rate) {
        (Some(time_base), Some(n_frames), _) => {
            let time = time_base.calc_time(n_frames);
            Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
        }
        (None, Some(n_frames), Some(rate)) if rate > 0 => {
            Some(Duration::from_secs_f64(n_frames as f64 / f64::from(rate)))
        }
        _ => None,
    };

    Ok(duration)
}

#[async_trait]
impl PlaybackDevice for HeadlessDevice {
    async fn bind(&self, url: &str) -> cadence_core::Result<BindingId> {
        let binding = BindingId(self.next_binding.fetch_add(1, Ordering::SeqCst) + 1);

        {
            let mut clock = self.clock();
            if clock.released {
                return Err(DeviceError::bind("device released"));
            }
            clock.stop_tasks();
            clock.binding = Some(binding);
            clock.ready = false;
            clock.duration = None;
            clock.position = Duration::ZERO;
            clock.playing = false;
        }

        let loader = self.spawn_loader(binding, url.to_string());
        self.clock().loader = Some(loader);

        debug!(%binding, url = %url, "Binding source");
        Ok(binding)
    }

    async fn play(&self) -> cadence_core::Result<()> {
        let binding = {
            let mut clock = self.clock();
            let Some(binding) = clock.binding else {
                return Err(DeviceError::rejected("nothing bound"));
            };
            if !clock.ready {
                return Err(DeviceError::rejected("source not ready"));
            }
            if clock.playing {
                return Ok(());
            }
            clock.playing = true;
            binding
        };

        let ticker = self.spawn_ticker(binding);
        let mut clock = self.clock();
        if let Some(previous) = clock.ticker.replace(ticker) {
            previous.abort();
        }
        Ok(())
    }

    async fn pause(&self) {
        let mut clock = self.clock();
        clock.playing = false;
        if let Some(ticker) = clock.ticker.take() {
            ticker.abort();
        }
    }

    async fn seek(&self, position: Duration) -> cadence_core::Result<()> {
        let mut clock = self.clock();
        if clock.binding.is_none() {
            return Err(DeviceError::rejected("nothing bound"));
        }
        clock.position = clock.duration.map_or(position, |d| position.min(d));
        Ok(())
    }

    async fn set_volume(&self, level: f32) {
        self.clock().volume = level.clamp(0.0, 1.0);
    }

    async fn clear(&self) {
        let mut clock = self.clock();
        clock.stop_tasks();
        clock.binding = None;
        clock.ready = false;
        clock.playing = false;
        clock.position = Duration::ZERO;
        clock.duration = None;
    }

    async fn release(&self) {
        self.clear().await;
        self.clock().released = true;
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceSignal> {
        self.signals.subscribe()
    }
}
