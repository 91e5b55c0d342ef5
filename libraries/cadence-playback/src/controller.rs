//! Playback controller - core orchestration
//!
//! Owns the single device binding and moves it between tracks. Navigation
//! is asymmetric: forward follows the backend queue and advances its
//! position, backward follows local history and never rewinds the queue.
//!
//! Transitions are single-flight. Every transition also takes a new
//! generation number; anything that resumes after a suspension checks its
//! generation first and discards its result if the controller moved on.

use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::guard::TransitionGuard;
use crate::history::History;
use crate::types::{PlaybackConfig, PlaybackSnapshot, TransitionOutcome};
use cadence_client::{prepare_for_playback, PreparedTrack, QueueClient, TrackResolver};
use cadence_core::{BindingId, DeviceError, DeviceSignal, PlaybackDevice, PlaybackState, Track};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Mutable session state
///
/// Guarded by a sync mutex that is never held across an `.await`.
#[derive(Debug)]
struct Session {
    state: PlaybackState,
    current: Option<Track>,
    /// Last track that reached Ready, kept for `retry`
    last_ready: Option<Track>,
    binding: Option<BindingId>,
    is_playing: bool,
    /// Play/pause requested while a load was in flight
    pending_intent: Option<bool>,
    current_time: Duration,
    duration: Option<Duration>,
    volume: f32,
}

impl Session {
    fn new(volume: f32) -> Self {
        Self {
            state: PlaybackState::Idle,
            current: None,
            last_ready: None,
            binding: None,
            is_playing: false,
            pending_intent: None,
            current_time: Duration::ZERO,
            duration: None,
            volume,
        }
    }
}

struct Inner {
    config: PlaybackConfig,
    queue: Arc<QueueClient>,
    resolver: TrackResolver,
    device: Arc<dyn PlaybackDevice>,
    history: Mutex<History>,
    session: Mutex<Session>,
    in_flight: AtomicBool,
    generation: AtomicU64,
    events: broadcast::Sender<PlaybackEvent>,
    shutdown: watch::Sender<bool>,
}

/// Where a forward transition found its track
enum Source {
    Queue(i64),
    Fallback,
}

/// Queue-synchronized playback controller
///
/// Cheap to clone; every clone drives the same session.
///
/// # Example
///
/// ```ignore
/// use cadence_playback::{PlaybackConfig, PlaybackController};
///
/// let controller = PlaybackController::new(PlaybackConfig::default(), queue, resolver, device);
/// let signals = controller.spawn_signal_loop();
///
/// controller.start().await;
/// controller.toggle_play().await;
/// controller.request_next().await;
/// ```
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    /// Create a controller around an exclusively owned device
    pub fn new(
        config: PlaybackConfig,
        queue: Arc<QueueClient>,
        resolver: TrackResolver,
        device: Arc<dyn PlaybackDevice>,
    ) -> Self {
        let volume = sanitize_volume(config.initial_volume).unwrap_or(1.0);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                config,
                queue,
                resolver,
                device,
                history: Mutex::new(History::new()),
                session: Mutex::new(Session::new(volume)),
                in_flight: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                events,
                shutdown,
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn history_mut(&self) -> MutexGuard<'_, History> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn set_state(&self, state: PlaybackState) {
        let changed = {
            let mut session = self.session();
            let changed = session.state != state;
            session.state = state;
            changed
        };

        if changed {
            debug!(%state, "State changed");
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    fn begin_transition(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::Acquire) != generation
    }

    // ===== Navigation =====

    /// Load the current queue entry (or a random track) paused
    ///
    /// Fetches the queue first; a failed fetch is logged and the random
    /// fallback used.
    pub async fn start(&self) -> TransitionOutcome {
        if self.is_shut_down() {
            return TransitionOutcome::NoOp;
        }
        let Some(_guard) = TransitionGuard::acquire(&self.inner.in_flight) else {
            debug!("Transition in flight, dropping start");
            return TransitionOutcome::Dropped;
        };
        let generation = self.begin_transition();

        // Failure already logged; the cache decides below
        let _ = self.inner.queue.fetch_queue().await;

        let track = match self.inner.queue.current_entry() {
            Some(entry) => match self.inner.resolver.resolve(&entry.title).await {
                Ok(track) => Ok(track),
                Err(e) => {
                    warn!(title = %entry.title, error = %e, "Failed to resolve current entry, using random track");
                    self.inner.resolver.random_track().await
                }
            },
            None => self.inner.resolver.random_track().await,
        };

        let track = match track {
            Ok(track) => track,
            Err(e) => {
                if self.is_stale(generation) {
                    debug!(error = %e, "Start superseded, dropping its failure");
                    return TransitionOutcome::Superseded;
                }
                self.enter_error(&e.into()).await;
                return TransitionOutcome::Failed;
            }
        };
        if self.is_stale(generation) {
            return TransitionOutcome::Superseded;
        }

        self.history_mut().append(track.clone());
        self.load(track, generation, false).await
    }

    /// Move to the next queue entry, or a random track past the end
    pub async fn request_next(&self) -> TransitionOutcome {
        let was_playing = self.session().is_playing;
        self.transition_forward(was_playing).await
    }

    async fn transition_forward(&self, was_playing: bool) -> TransitionOutcome {
        if self.is_shut_down() {
            return TransitionOutcome::NoOp;
        }
        let Some(_guard) = TransitionGuard::acquire(&self.inner.in_flight) else {
            debug!("Transition in flight, dropping next request");
            return TransitionOutcome::Dropped;
        };
        let generation = self.begin_transition();
        debug!(generation, was_playing, "Forward transition");

        self.teardown().await;
        self.settle().await;
        if self.is_stale(generation) {
            return TransitionOutcome::Superseded;
        }

        let (track, source) = match self.pick_forward_target().await {
            Ok(target) => target,
            Err(e) => {
                if self.is_stale(generation) {
                    debug!(error = %e, "Transition superseded, dropping its failure");
                    return TransitionOutcome::Superseded;
                }
                self.enter_error(&e).await;
                return TransitionOutcome::Failed;
            }
        };
        if self.is_stale(generation) {
            return TransitionOutcome::Superseded;
        }

        self.history_mut().append(track.clone());
        if let Source::Queue(position) = source {
            // Refresh runs in the background
            drop(self.inner.queue.advance_position(position));
        }

        self.load(track, generation, was_playing).await
    }

    /// Next queue entry, falling back to a random track once
    async fn pick_forward_target(&self) -> Result<(Track, Source)> {
        if let Some(entry) = self.inner.queue.next_entry() {
            match self.inner.resolver.resolve(&entry.title).await {
                Ok(track) => return Ok((track, Source::Queue(entry.position))),
                Err(e) => {
                    warn!(
                        title = %entry.title,
                        position = entry.position,
                        error = %e,
                        "Failed to resolve next entry, falling back to random track"
                    );
                }
            }
        }

        let track = self.inner.resolver.random_track().await?;
        Ok((track, Source::Fallback))
    }

    /// Restart the current track, or step back through history
    ///
    /// Past the restart threshold this only rewinds. Otherwise the previous
    /// history entry is rebound from its stored snapshot without touching the
    /// backend or the queue position.
    pub async fn request_previous(&self) -> TransitionOutcome {
        if self.is_shut_down() {
            return TransitionOutcome::NoOp;
        }

        let (elapsed, was_playing) = {
            let session = self.session();
            (session.current_time, session.is_playing)
        };

        if elapsed > self.inner.config.restart_threshold {
            return match self.restart().await {
                Ok(()) => TransitionOutcome::Restarted,
                Err(e) => {
                    debug!(error = %e, "Nothing to restart");
                    TransitionOutcome::NoOp
                }
            };
        }

        let Some(_guard) = TransitionGuard::acquire(&self.inner.in_flight) else {
            debug!("Transition in flight, dropping previous request");
            return TransitionOutcome::Dropped;
        };

        let Some(track) = self.history_mut().step_back() else {
            debug!("No earlier history entry");
            return TransitionOutcome::NoOp;
        };

        let generation = self.begin_transition();
        debug!(generation, title = %track.title, "Backward transition");

        self.teardown().await;
        self.settle().await;
        if self.is_stale(generation) {
            return TransitionOutcome::Superseded;
        }

        self.load(track, generation, was_playing).await
    }

    async fn restart(&self) -> Result<()> {
        let bound = self.session().binding.is_some();
        if !bound {
            return Err(PlaybackError::NoTrack);
        }

        self.inner.device.seek(Duration::ZERO).await?;
        let duration = {
            let mut session = self.session();
            session.current_time = Duration::ZERO;
            session.duration
        };
        info!("Restarted current track");
        self.emit_position(Duration::ZERO, duration);
        Ok(())
    }

    /// Rebind the last track that reached Ready, from the error state
    pub async fn retry(&self) -> TransitionOutcome {
        let (state, track) = {
            let session = self.session();
            (session.state, session.last_ready.clone())
        };
        if state != PlaybackState::Error {
            return TransitionOutcome::NoOp;
        }
        let Some(track) = track else {
            debug!("Nothing to retry");
            return TransitionOutcome::NoOp;
        };

        let Some(_guard) = TransitionGuard::acquire(&self.inner.in_flight) else {
            return TransitionOutcome::Dropped;
        };
        let generation = self.begin_transition();
        info!(title = %track.title, "Retrying");

        self.load(track, generation, false).await
    }

    // ===== Transition steps =====

    /// Stop and unbind the current source
    async fn teardown(&self) {
        {
            let mut session = self.session();
            session.is_playing = false;
            session.binding = None;
            session.current_time = Duration::ZERO;
        }
        self.set_state(PlaybackState::Transitioning);

        let device = &self.inner.device;
        device.pause().await;
        if let Err(e) = device.seek(Duration::ZERO).await {
            debug!(error = %e, "Seek during teardown failed");
        }
        device.clear().await;
    }

    async fn settle(&self) {
        let delay = self.inner.config.settle_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Bind `track`, wait until it can play through, then honour the intent
    async fn load(&self, track: Track, generation: u64, was_playing: bool) -> TransitionOutcome {
        let previous_title = {
            let mut session = self.session();
            let previous = session.current.replace(track.clone()).map(|t| t.title);
            session.binding = None;
            session.duration = track.duration;
            session.current_time = Duration::ZERO;
            previous
        };
        self.set_state(PlaybackState::Loading);
        self.emit(PlaybackEvent::TrackChanged {
            title: track.title.clone(),
            previous_title,
        });

        let prepared = self.prepare(&track).await;
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(e) if e.is_superseded() || self.is_stale(generation) => {
                debug!(title = %track.title, "Load superseded");
                return TransitionOutcome::Superseded;
            }
            Err(e) => {
                self.enter_error(&e.into()).await;
                return TransitionOutcome::Failed;
            }
        };
        if self.is_stale(generation) {
            debug!(title = %track.title, generation, "Discarding stale load");
            return TransitionOutcome::Superseded;
        }

        let volume = self.session().volume;
        self.inner.device.set_volume(volume).await;

        let want_play = {
            let mut session = self.session();
            session.binding = Some(prepared.binding);
            if prepared.duration.is_some() {
                session.duration = prepared.duration;
            }
            session.last_ready = Some(track.clone());
            session.pending_intent.take().unwrap_or(was_playing)
        };
        self.set_state(PlaybackState::Ready);
        info!(title = %track.title, binding = %prepared.binding, generation, "Track ready");

        if want_play {
            self.start_playback().await;
        }

        TransitionOutcome::Completed
    }

    /// Prepare on the device, giving up if the controller shuts down
    async fn prepare(&self, track: &Track) -> std::result::Result<PreparedTrack, DeviceError> {
        let stopped = wait_for_shutdown(self.inner.shutdown.subscribe());

        tokio::select! {
            result = prepare_for_playback(self.inner.device.as_ref(), track, self.inner.config.ready_timeout) => result,
            () = stopped => Err(DeviceError::Superseded),
        }
    }

    /// Failure with no way forward: clear the device, keep the last good track
    async fn enter_error(&self, err: &PlaybackError) {
        error!(error = %err, "Playback failed");
        self.inner.device.clear().await;

        {
            let mut session = self.session();
            session.binding = None;
            session.is_playing = false;
            session.pending_intent = None;
            session.current_time = Duration::ZERO;
            session.current = session.last_ready.clone();
            session.duration = session.current.as_ref().and_then(|t| t.duration);
        }
        self.set_state(PlaybackState::Error);
        self.emit(PlaybackEvent::Error {
            message: err.to_string(),
        });
    }

    // ===== Transport =====

    /// Ask the device to play the bound source
    ///
    /// A rejection demotes `is_playing`; it never propagates. A play that
    /// lost to a newer load in flight is handed to that load as its intent.
    async fn start_playback(&self) {
        let err = match self.inner.device.play().await {
            Ok(()) => {
                self.session().is_playing = true;
                self.set_state(PlaybackState::Playing);
                return;
            }
            Err(e) => e,
        };

        let deferred = err.is_superseded() && {
            let mut session = self.session();
            let busy = session.state.is_busy();
            if busy {
                session.pending_intent = Some(true);
            }
            busy
        };

        if deferred {
            debug!("Play superseded by a later load");
        } else {
            warn!(error = %err, "Device rejected play");
            self.session().is_playing = false;
            self.set_state(PlaybackState::Ready);
        }
    }

    /// Play, or record the intent while a load is in flight
    pub async fn play(&self) {
        self.set_playing(true).await;
    }

    /// Pause, or record the intent while a load is in flight
    pub async fn pause(&self) {
        self.set_playing(false).await;
    }

    /// Flip the play/pause intent
    pub async fn toggle_play(&self) {
        let intent = {
            let session = self.session();
            !session.pending_intent.unwrap_or(session.is_playing)
        };
        self.set_playing(intent).await;
    }

    async fn set_playing(&self, play: bool) {
        let state = {
            let mut session = self.session();
            session.pending_intent = session.state.is_busy().then_some(play);
            session.state
        };

        match (state, play) {
            (s, _) if s.is_busy() => debug!(play, "Recorded intent while loading"),
            (PlaybackState::Ready, true) => self.start_playback().await,
            (PlaybackState::Playing, false) => {
                self.inner.device.pause().await;
                self.session().is_playing = false;
                self.set_state(PlaybackState::Ready);
            }
            (PlaybackState::Idle | PlaybackState::Error, _) => {
                debug!(%state, "Nothing bound, ignoring play/pause");
            }
            _ => {}
        }
    }

    /// Move the playback position of the bound source
    pub async fn seek(&self, position: Duration) -> bool {
        let (state, duration) = {
            let session = self.session();
            (session.state, session.duration)
        };
        if !state.is_bound() {
            debug!(%state, "Nothing bound, ignoring seek");
            return false;
        }

        let position = duration.map_or(position, |d| position.min(d));
        match self.inner.device.seek(position).await {
            Ok(()) => {
                self.session().current_time = position;
                self.emit_position(position, duration);
                true
            }
            Err(e) => {
                warn!(error = %e, "Seek failed");
                false
            }
        }
    }

    /// Set output volume (clamped to 0.0-1.0; NaN is ignored)
    pub async fn set_volume(&self, level: f32) {
        let Some(level) = sanitize_volume(level) else {
            debug!("Ignoring non-finite volume");
            return;
        };

        let bound = {
            let mut session = self.session();
            session.volume = level;
            session.binding.is_some()
        };
        if bound {
            self.inner.device.set_volume(level).await;
        }
        self.emit(PlaybackEvent::VolumeChanged { level });
    }

    // ===== Queue =====

    /// Append a title to the backend queue
    pub async fn enqueue(&self, title: &str) -> bool {
        let result = self.inner.queue.enqueue(title).await;
        self.queue_mutated(result)
    }

    /// Remove the entry at `position` from the backend queue
    pub async fn dequeue(&self, position: i64) -> bool {
        let result = self.inner.queue.dequeue(position).await;
        self.queue_mutated(result)
    }

    /// Move a backend queue entry
    pub async fn move_entry(&self, from: i64, to: i64) -> bool {
        let result = self.inner.queue.move_entry(from, to).await;
        self.queue_mutated(result)
    }

    fn queue_mutated(&self, result: cadence_client::Result<()>) -> bool {
        match result {
            Ok(()) => {
                self.emit(PlaybackEvent::QueueChanged {
                    length: self.inner.queue.entries().len(),
                });
                true
            }
            // Logged by the queue client
            Err(_) => false,
        }
    }

    // ===== Device signals =====

    /// Apply one device signal
    ///
    /// Signals for anything but the current binding are dropped. `Ended`
    /// runs a whole forward transition before returning.
    pub async fn handle_signal(&self, signal: DeviceSignal) {
        let (binding, was_playing) = {
            let session = self.session();
            (session.binding, session.is_playing)
        };
        if binding != Some(signal.binding()) {
            debug!(signal = ?signal, "Ignoring signal for inactive binding");
            return;
        }

        match signal {
            DeviceSignal::TimeUpdated { position, .. } => {
                let duration = {
                    let mut session = self.session();
                    session.current_time = position;
                    session.duration
                };
                self.emit_position(position, duration);
            }
            DeviceSignal::MetadataReady { duration, .. } => {
                if duration.is_some() {
                    self.session().duration = duration;
                }
            }
            DeviceSignal::CanPlayThrough { .. } => {}
            DeviceSignal::Ended { .. } => {
                info!("Track ended, advancing");
                let outcome = self.transition_forward(was_playing).await;
                debug!(?outcome, "Auto-advance finished");
            }
            DeviceSignal::Error { message, .. } => {
                self.enter_error(&DeviceError::load(message).into()).await;
            }
        }
    }

    /// Forward device signals into `handle_signal` until shutdown
    ///
    /// `Ended` is handled on its own task so position updates keep flowing
    /// while the next track loads.
    pub fn spawn_signal_loop(&self) -> JoinHandle<()> {
        let mut signals = self.inner.device.subscribe();
        let stopped = wait_for_shutdown(self.inner.shutdown.subscribe());
        let controller = self.clone();

        tokio::spawn(async move {
            tokio::pin!(stopped);
            loop {
                let signal = tokio::select! {
                    () = &mut stopped => break,
                    received = signals.recv() => match received {
                        Ok(signal) => signal,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Device signals lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };

                if matches!(signal, DeviceSignal::Ended { .. }) {
                    let controller = controller.clone();
                    tokio::spawn(async move { controller.handle_signal(signal).await });
                } else {
                    controller.handle_signal(signal).await;
                }
            }
            debug!("Signal loop stopped");
        })
    }

    // ===== Read access =====

    /// Current session as seen by a rendering layer
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let transition_in_progress = self.inner.in_flight.load(Ordering::Acquire);
        let queue_position = self.inner.queue.current_position();
        let session = self.session();

        PlaybackSnapshot {
            track: session.current.clone(),
            state: session.state,
            is_playing: session.is_playing,
            is_loading: session.state.is_busy(),
            current_time: session.current_time,
            duration: session.duration,
            volume: session.volume,
            transition_in_progress,
            queue_position,
        }
    }

    /// Copy of the played-track history
    pub fn history(&self) -> History {
        self.history_mut().clone()
    }

    /// The queue client this controller navigates
    pub fn queue(&self) -> &Arc<QueueClient> {
        &self.inner.queue
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.inner.events.subscribe()
    }

    /// Unbind and release the device; later intents are no-ops
    pub async fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.shutdown.send_replace(true);

        let device = &self.inner.device;
        device.pause().await;
        device.clear().await;
        device.release().await;

        {
            let mut session = self.session();
            session.binding = None;
            session.is_playing = false;
            session.pending_intent = None;
        }
        self.set_state(PlaybackState::Idle);
        info!("Playback controller shut down");
    }

    fn emit_position(&self, position: Duration, duration: Option<Duration>) {
        self.emit(PlaybackEvent::PositionUpdate {
            position_ms: position.as_millis() as u64,
            duration_ms: duration.map(|d| d.as_millis() as u64),
        });
    }
}

fn sanitize_volume(level: f32) -> Option<f32> {
    (!level.is_nan()).then(|| level.clamp(0.0, 1.0))
}

/// Resolves once the shutdown flag is set
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_clamped() {
        assert_eq!(sanitize_volume(1.5), Some(1.0));
        assert_eq!(sanitize_volume(-0.2), Some(0.0));
        assert_eq!(sanitize_volume(0.4), Some(0.4));
        assert_eq!(sanitize_volume(f32::NAN), None);
    }

    #[tokio::test]
    async fn shutdown_wait_resolves_after_flag() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));

        tx.send_replace(true);
        waiter.await.unwrap();
    }
}
