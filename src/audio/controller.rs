//! The playback state machine.
//!
//! `PlaybackController` is the only writer of playback state. It owns at most
//! one engine and one position sampler at a time and reacts to user commands
//! and engine events one message at a time.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{AudioSettings, PlaybackSettings};
use crate::library::TrackCatalog;

use super::engine::{EngineBackend, PlaybackEngine};
use super::queue::{next_index, prev_index};
use super::sampler::PositionSampler;
use super::types::{
    EngineEvent, EventSink, PlaybackHandle, PlaybackSnapshot, PlayerCmd, PlayerMsg, PlayerStatus,
};

pub struct PlaybackController {
    backend: Box<dyn EngineBackend>,
    tx: Sender<PlayerMsg>,
    shared: PlaybackHandle,
    engine: Option<Box<dyn PlaybackEngine>>,
    sampler: Option<PositionSampler>,
    /// Bumped whenever the sampler is cancelled; older samples are dropped.
    sample_epoch: u64,
    state: PlaybackSnapshot,
    sample_interval: Duration,
    autoplay: bool,
}

impl PlaybackController {
    pub fn new(
        backend: Box<dyn EngineBackend>,
        tx: Sender<PlayerMsg>,
        shared: PlaybackHandle,
        audio: &AudioSettings,
        playback: &PlaybackSettings,
    ) -> Self {
        let state = PlaybackSnapshot {
            volume: audio.initial_volume.clamp(0.0, 1.0),
            muted: playback.start_muted,
            loop_one: playback.loop_one,
            ..PlaybackSnapshot::default()
        };
        Self {
            backend,
            tx,
            shared,
            engine: None,
            sampler: None,
            sample_epoch: 0,
            state,
            sample_interval: Duration::from_millis(audio.position_interval_ms.max(1)),
            autoplay: playback.autoplay,
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.state
    }

    /// Copy the current state into the shared handle.
    pub fn publish(&self) {
        if let Ok(mut shared) = self.shared.lock() {
            *shared = self.state.clone();
        }
    }

    /// Apply one message. Returns false once the player should exit.
    pub fn handle(&mut self, msg: PlayerMsg) -> bool {
        match msg {
            PlayerMsg::Command(cmd) => return self.command(cmd),
            PlayerMsg::Engine { generation, event } => {
                if generation == self.state.generation {
                    self.on_event(event);
                } else {
                    // A superseded engine arriving via `Ready` is dropped here.
                    debug!(generation, current = self.state.generation, ?event, "stale engine event");
                }
            }
        }
        true
    }

    fn command(&mut self, cmd: PlayerCmd) -> bool {
        match cmd {
            PlayerCmd::Select(i) => self.select_track(i),
            PlayerCmd::Next => self.next(),
            PlayerCmd::Prev => self.prev(),
            PlayerCmd::TogglePause => self.toggle_play_pause(),
            PlayerCmd::Stop => self.stop(),
            PlayerCmd::Seek(pos) => self.seek(pos),
            PlayerCmd::SeekBy(secs) => self.seek_by(secs),
            PlayerCmd::ChangeVolume(delta) => self.change_volume(delta),
            PlayerCmd::ToggleMute => self.toggle_mute(),
            PlayerCmd::ToggleLoopOne => self.toggle_loop_one(),
            PlayerCmd::ReleaseCatalog(ack) => {
                self.release_catalog();
                // Observers must see the empty catalog before the caller
                // goes on to build the next one.
                self.publish();
                let _ = ack.send(());
            }
            PlayerCmd::ReplaceCatalog(catalog) => self.replace_catalog(catalog),
            PlayerCmd::Quit => {
                self.teardown();
                return false;
            }
        }
        true
    }

    /// Periodic housekeeping: detects a track that drained on its own.
    pub fn tick(&mut self) {
        if self.state.status != PlayerStatus::Playing {
            return;
        }
        let finished = self.engine.as_ref().is_some_and(|e| e.is_finished());
        if finished {
            self.on_event(EngineEvent::End);
        }
    }

    pub fn select_track(&mut self, index: usize) {
        if index >= self.state.catalog.len() {
            debug!(index, len = self.state.catalog.len(), "select out of range");
            return;
        }
        self.load(index);
    }

    pub fn next(&mut self) {
        if let Some(cur) = self.state.current_index {
            self.load(next_index(cur, self.state.catalog.len()));
        }
    }

    pub fn prev(&mut self) {
        if let Some(cur) = self.state.current_index {
            self.load(prev_index(cur, self.state.catalog.len()));
        }
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match self.state.status {
            PlayerStatus::Playing => {
                engine.pause();
                self.cancel_sampler();
            }
            PlayerStatus::Paused | PlayerStatus::Stopped => engine.play(),
            PlayerStatus::Idle | PlayerStatus::Loading => {}
        }
    }

    pub fn stop(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.stop();
        self.cancel_sampler();
    }

    pub fn seek(&mut self, position: Duration) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let target = position.min(self.state.duration);
        engine.seek(target);
        self.state.position = target;

        // Samples taken before the seek must not pull the position back.
        if self.sampler.is_some() {
            self.cancel_sampler();
            self.start_sampler();
        }
    }

    /// Seek relative to the live position.
    pub fn seek_by(&mut self, secs: i64) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let now = (engine.position_probe())();
        let step = Duration::from_secs(secs.unsigned_abs());
        let target = if secs < 0 {
            now.saturating_sub(step)
        } else {
            now.saturating_add(step)
        };
        self.seek(target);
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.state.volume = volume.clamp(0.0, 1.0);
        if !self.state.muted {
            self.forward_volume();
        }
    }

    pub fn change_volume(&mut self, delta: f32) {
        self.set_volume(self.state.volume + delta);
    }

    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.forward_volume();
    }

    pub fn toggle_loop_one(&mut self) {
        self.state.loop_one = !self.state.loop_one;
        info!(loop_one = self.state.loop_one, "loop-one toggled");
    }

    /// Swap in a new catalog. The old engine and catalog are gone before the
    /// first track of the new one is loaded.
    pub fn replace_catalog(&mut self, catalog: TrackCatalog) {
        self.release_catalog();
        self.state.catalog = Arc::new(catalog);
        info!(tracks = self.state.catalog.len(), "catalog installed");

        if self.state.catalog.is_empty() {
            return;
        }
        if self.autoplay {
            self.load(0);
        } else {
            self.state.current_index = Some(0);
            self.state.status = PlayerStatus::Stopped;
            self.state.duration = self.state.catalog.get(0).map(|t| t.duration).unwrap_or_default();
        }
    }

    /// Tear down playback and drop this controller's hold on the catalog.
    pub fn release_catalog(&mut self) {
        self.teardown();
        self.state.catalog = Arc::new(TrackCatalog::default());
        self.state.status = PlayerStatus::Idle;
        self.state.current_index = None;
        self.state.duration = Duration::ZERO;
        self.state.load_error = None;
    }

    /// Release the engine and sampler. Events already in flight from them
    /// are ignored afterwards.
    pub fn teardown(&mut self) {
        self.release_engine();
        self.state.position = Duration::ZERO;
        if self.state.status != PlayerStatus::Idle {
            self.state.status = PlayerStatus::Stopped;
        }
    }

    fn load(&mut self, index: usize) {
        let catalog = Arc::clone(&self.state.catalog);
        let Some(track) = catalog.get(index) else {
            return;
        };

        self.release_engine();
        self.state.current_index = Some(index);
        self.state.status = PlayerStatus::Loading;
        self.state.position = Duration::ZERO;
        self.state.duration = track.duration;
        self.state.load_error = None;

        debug!(index, file = track.file_name(), generation = self.state.generation, "loading");
        let events = EventSink::new(self.tx.clone(), self.state.generation);
        self.backend.load(track, events);
    }

    /// Drop the current engine and start a new generation. Dropping an
    /// engine silences it.
    fn release_engine(&mut self) {
        self.cancel_sampler();
        self.engine = None;
        self.state.engine_loaded = false;
        self.state.generation += 1;
    }

    fn cancel_sampler(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.cancel();
            self.sample_epoch += 1;
        }
    }

    fn start_sampler(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let events = EventSink::new(self.tx.clone(), self.state.generation);
        match PositionSampler::start(
            engine.position_probe(),
            events,
            self.sample_epoch,
            self.sample_interval,
        ) {
            Ok(sampler) => self.sampler = Some(sampler),
            Err(e) => warn!(error = %e, "position sampling unavailable"),
        }
    }

    fn forward_volume(&mut self) {
        let volume = self.state.effective_volume();
        if let Some(engine) = self.engine.as_mut() {
            engine.set_volume(volume);
        }
    }

    fn on_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready(mut engine) => {
                if let Some(d) = engine.duration() {
                    self.state.duration = d;
                }
                engine.set_volume(self.state.effective_volume());
                self.engine = Some(engine);
                self.state.engine_loaded = true;
                if let Some(engine) = self.engine.as_mut() {
                    engine.play();
                }
            }
            EngineEvent::LoadFailed(e) => {
                let file = self
                    .state
                    .current_index
                    .and_then(|i| self.state.catalog.get(i))
                    .map(|t| t.file_name().to_string())
                    .unwrap_or_default();
                error!(file, error = %e, "could not load track");
                self.state.status = PlayerStatus::Stopped;
                self.state.position = Duration::ZERO;
                self.state.load_error = Some(format!("{file}: {e}"));
            }
            EngineEvent::Play => {
                let Some(engine) = self.engine.as_ref() else {
                    return;
                };
                if let Some(d) = engine.duration() {
                    self.state.duration = d;
                }
                self.state.status = PlayerStatus::Playing;

                self.cancel_sampler();
                self.start_sampler();
            }
            EngineEvent::Pause => {
                self.cancel_sampler();
                if let Some(engine) = self.engine.as_ref() {
                    self.state.position = (engine.position_probe())().min(self.state.duration);
                }
                self.state.status = PlayerStatus::Paused;
            }
            EngineEvent::Stop => {
                self.cancel_sampler();
                self.state.status = PlayerStatus::Stopped;
                self.state.position = Duration::ZERO;
            }
            EngineEvent::End => {
                self.cancel_sampler();
                let Some(cur) = self.state.current_index else {
                    return;
                };
                if self.state.loop_one {
                    self.load(cur);
                } else {
                    self.next();
                }
            }
            EngineEvent::Position { epoch, position: pos } => {
                if epoch != self.sample_epoch {
                    debug!(epoch, current = self.sample_epoch, "stale position sample");
                } else if self.state.status == PlayerStatus::Playing {
                    self.state.position = pos.min(self.state.duration);
                }
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.teardown();
    }
}
