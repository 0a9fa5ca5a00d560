//! The seam between the controller and whatever produces sound.

use std::sync::Arc;
use std::time::Duration;

use crate::library::Track;

use super::types::{EngineEvent, EventSink, LoadError};

/// Reads the live position of an engine from another thread.
pub type PositionProbe = Arc<dyn Fn() -> Duration + Send + Sync>;

/// One decoding/output session bound to a single track.
///
/// Transport calls report back through the `EventSink` the engine was
/// created with (`Play`, `Pause`, `Stop`, `End`). Dropping the engine
/// releases the session.
pub trait PlaybackEngine: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Halt output and rewind to 0.
    fn stop(&mut self);
    /// Caller clamps `position` to `[0, duration]`.
    fn seek(&mut self, position: Duration);
    /// Linear volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
    fn duration(&self) -> Option<Duration>;
    /// True once the source has drained on its own.
    fn is_finished(&self) -> bool;
    fn position_probe(&self) -> PositionProbe;
}

/// Prepares engines.
pub trait EngineBackend {
    /// Start preparing `track` off the calling thread. The outcome arrives
    /// on `events` as `Ready` or `LoadFailed`.
    fn load(&mut self, track: &Track, events: EventSink);
}

/// Stand-in used when no output device could be opened: every load fails.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl EngineBackend for UnavailableBackend {
    fn load(&mut self, _track: &Track, events: EventSink) {
        events.emit(EngineEvent::LoadFailed(LoadError::NoOutput(
            self.reason.clone(),
        )));
    }
}
