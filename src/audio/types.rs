//! Audio-related small types and handles.
//!
//! Commands sent to the player thread, events flowing back from engines,
//! and the snapshot the player publishes for the UI.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::library::TrackCatalog;

use super::engine::PlaybackEngine;

/// The playback status of the player.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlayerStatus {
    /// No catalog loaded.
    #[default]
    Idle,
    /// A track is being prepared.
    Loading,
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no audio output available: {0}")]
    NoOutput(String),
    #[error("failed to decode {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: rodio::decoder::DecoderError,
    },
    #[error("failed to start loader for {file}: {source}")]
    Spawn {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Events emitted by a backend or a live engine.
pub enum EngineEvent {
    /// A `load` finished; the engine is paused at 0 and ready to play.
    Ready(Box<dyn PlaybackEngine>),
    /// A `load` could not produce an engine.
    LoadFailed(LoadError),
    /// Output actually started; duration is known from here on.
    Play,
    Pause,
    Stop,
    /// The track played through to its natural end.
    End,
    /// Periodic position sample, tagged with the sampler run that took it.
    Position { epoch: u64, position: Duration },
}

impl std::fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::LoadFailed(e) => f.debug_tuple("LoadFailed").field(e).finish(),
            Self::Play => f.write_str("Play"),
            Self::Pause => f.write_str("Pause"),
            Self::Stop => f.write_str("Stop"),
            Self::End => f.write_str("End"),
            Self::Position { epoch, position } => f
                .debug_struct("Position")
                .field("epoch", epoch)
                .field("position", position)
                .finish(),
        }
    }
}

/// User-facing commands accepted by the player thread.
#[derive(Debug)]
pub enum PlayerCmd {
    /// Load and play the track at the given index.
    Select(usize),
    Next,
    Prev,
    TogglePause,
    Stop,
    /// Seek to an absolute position.
    Seek(Duration),
    /// Seek relative to the current position (seconds, positive or negative).
    SeekBy(i64),
    /// Change the volume by the given (signed) amount.
    ChangeVolume(f32),
    ToggleMute,
    ToggleLoopOne,
    /// Tear down playback and drop the current catalog; acknowledges once done.
    ReleaseCatalog(Sender<()>),
    /// Install a freshly ingested catalog.
    ReplaceCatalog(TrackCatalog),
    /// Tear down and leave the thread.
    Quit,
}

/// Everything the player thread reacts to, in arrival order.
#[derive(Debug)]
pub enum PlayerMsg {
    Command(PlayerCmd),
    Engine { generation: u64, event: EngineEvent },
}

/// Tags engine events with the load generation that produced them.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<PlayerMsg>,
    generation: u64,
}

impl EventSink {
    pub fn new(tx: Sender<PlayerMsg>, generation: u64) -> Self {
        Self { tx, generation }
    }

    /// Returns false once the player is gone.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.tx
            .send(PlayerMsg::Engine {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

#[derive(Debug, Clone)]
/// Observable playback state published after every change.
pub struct PlaybackSnapshot {
    pub status: PlayerStatus,
    /// `None` exactly when the catalog is empty.
    pub current_index: Option<usize>,
    pub position: Duration,
    pub duration: Duration,
    /// Last user-set volume, kept while muted.
    pub volume: f32,
    pub muted: bool,
    pub loop_one: bool,
    /// An engine is attached to the current track.
    pub engine_loaded: bool,
    /// Why the current track could not be loaded, if it could not.
    pub load_error: Option<String>,
    /// Bumped whenever the engine is released or replaced.
    pub generation: u64,
    pub catalog: Arc<TrackCatalog>,
}

impl PlaybackSnapshot {
    /// Volume the engine actually receives.
    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            status: PlayerStatus::Idle,
            current_index: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: 1.0,
            muted: false,
            loop_one: false,
            engine_loaded: false,
            load_error: None,
            generation: 0,
            catalog: Arc::new(TrackCatalog::default()),
        }
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackSnapshot>>;
