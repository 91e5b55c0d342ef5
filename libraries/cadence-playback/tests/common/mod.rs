//! Shared fixtures: a scriptable device and a mocked backend.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_client::{BackendClient, BackendConfig, QueueClient, TrackResolver};
use cadence_core::{BindingId, DeviceError, DeviceSignal, PlaybackDevice};
use cadence_playback::{PlaybackConfig, PlaybackController, PlaybackEvent};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Fake device
// =============================================================================

/// What the device does after a bind
#[derive(Debug, Clone)]
pub enum ReadyBehavior {
    /// Emit metadata then can-play-through
    Ready,
    /// Emit an error for the binding
    Fail(String),
    /// Emit nothing; the test drives signals by hand
    Silent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bind(String),
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f32),
    Clear,
    Release,
}

struct Script {
    ready: ReadyBehavior,
    duration: Option<Duration>,
    play_error: Option<DeviceError>,
}

pub struct FakeDevice {
    signals: broadcast::Sender<DeviceSignal>,
    next_binding: AtomicU64,
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        let (signals, _) = broadcast::channel(64);
        Arc::new(Self {
            signals,
            next_binding: AtomicU64::new(0),
            script: Mutex::new(Script {
                ready: ReadyBehavior::Ready,
                duration: Some(Duration::from_secs(180)),
                play_error: None,
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_ready(&self, ready: ReadyBehavior) {
        self.script.lock().unwrap().ready = ready;
    }

    pub fn reject_play(&self, error: Option<DeviceError>) {
        self.script.lock().unwrap().play_error = error;
    }

    pub fn emit(&self, signal: DeviceSignal) {
        let _ = self.signals.send(signal);
    }

    /// Id handed out by the most recent bind
    pub fn last_binding(&self) -> BindingId {
        BindingId(self.next_binding.load(Ordering::SeqCst))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bound_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Bind(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn play_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Play).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybackDevice for FakeDevice {
    async fn bind(&self, url: &str) -> cadence_core::Result<BindingId> {
        self.record(Call::Bind(url.to_string()));
        let binding = BindingId(self.next_binding.fetch_add(1, Ordering::SeqCst) + 1);

        let (ready, duration) = {
            let script = self.script.lock().unwrap();
            (script.ready.clone(), script.duration)
        };

        let signals = self.signals.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            match ready {
                ReadyBehavior::Ready => {
                    let _ = signals.send(DeviceSignal::MetadataReady { binding, duration });
                    let _ = signals.send(DeviceSignal::CanPlayThrough { binding });
                }
                ReadyBehavior::Fail(message) => {
                    let _ = signals.send(DeviceSignal::Error { binding, message });
                }
                ReadyBehavior::Silent => {}
            }
        });

        Ok(binding)
    }

    async fn play(&self) -> cadence_core::Result<()> {
        self.record(Call::Play);
        match self.script.lock().unwrap().play_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn pause(&self) {
        self.record(Call::Pause);
    }

    async fn seek(&self, position: Duration) -> cadence_core::Result<()> {
        self.record(Call::Seek(position));
        Ok(())
    }

    async fn set_volume(&self, level: f32) {
        self.record(Call::SetVolume(level));
    }

    async fn clear(&self) {
        self.record(Call::Clear);
    }

    async fn release(&self) {
        self.record(Call::Release);
    }

    fn subscribe(&self) -> broadcast::Receiver<DeviceSignal> {
        self.signals.subscribe()
    }
}

// =============================================================================
// Mocked backend
// =============================================================================

pub fn song_json(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "artist": "Test Artist",
        "album": "Test Album",
        "length": "Unknown Length",
        "path": format!("Test Artist\\Test Album\\{}.mp3", title),
        "cover_art": null
    })
}

/// Media URL the resolver derives for `title`
pub fn media_url(server: &MockServer, title: &str) -> String {
    format!("{}/api/audio/{}.mp3", server.uri(), title)
}

pub async fn mount_queue(server: &MockServer, entries: &[(i64, &str)]) {
    let body: Vec<_> = entries
        .iter()
        .map(|(position, title)| json!({"position": position, "title": title}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// `/song/{title}` answering with metadata, expected `times` times
pub async fn mount_song(server: &MockServer, title: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/song/{}", title)))
        .respond_with(ResponseTemplate::new(200).set_body_json(song_json(title)))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_missing_song(server: &MockServer, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/song/{}", title)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "No song found"})))
        .mount(server)
        .await;
}

/// `/random_song` answering with `title`, expected `times` times
pub async fn mount_random(server: &MockServer, title: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/random_song"))
        .respond_with(ResponseTemplate::new(200).set_body_json(song_json(title)))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mount_random_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/random_song"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database locked"))
        .mount(server)
        .await;
}

/// `/random_song` failing only after `delay`
pub async fn mount_slow_random_failure(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/api/random_song"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("database locked")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

// =============================================================================
// Controller
// =============================================================================

pub fn fast_config() -> PlaybackConfig {
    PlaybackConfig {
        settle_delay: Duration::from_millis(10),
        ready_timeout: Some(Duration::from_secs(5)),
        ..PlaybackConfig::default()
    }
}

pub fn controller(
    server: &MockServer,
    device: &Arc<FakeDevice>,
    config: PlaybackConfig,
) -> PlaybackController {
    let backend = BackendClient::new(BackendConfig::new(format!("{}/api", server.uri()))).unwrap();
    let queue = Arc::new(QueueClient::new(backend.clone()));
    let resolver = TrackResolver::new(backend);
    let device: Arc<dyn PlaybackDevice> = device.clone();

    PlaybackController::new(config, queue, resolver, device)
}

pub fn current_title(controller: &PlaybackController) -> Option<String> {
    controller.snapshot().track.map(|t| t.title)
}

pub fn history_titles(controller: &PlaybackController) -> Vec<String> {
    controller
        .history()
        .tracks()
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

/// Wait for the first event matching `pred`
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<PlaybackEvent>,
    pred: impl Fn(&PlaybackEvent) -> bool,
) -> PlaybackEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Poll until `cond` holds
pub async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}
