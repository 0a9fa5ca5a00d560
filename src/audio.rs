//! Playback: a single player thread owns the controller, engines and
//! sampler; the UI talks to it through `AudioPlayer`.

mod controller;
mod engine;
mod player;
mod queue;
mod sampler;
mod sink;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::{PlaybackSnapshot, PlayerCmd, PlayerStatus};
