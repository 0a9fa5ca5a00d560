use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{AudioSettings, PlaybackSettings};

use super::controller::PlaybackController;
use super::engine::{EngineBackend, UnavailableBackend};
use super::sink::RodioBackend;
use super::types::{PlaybackHandle, PlayerMsg};

/// Spawn the player thread.
///
/// The output stream is opened on the thread itself; when no device is
/// available the player still runs and every load reports `LoadFailed`.
pub(super) fn spawn_player_thread(
    rx: Receiver<PlayerMsg>,
    tx: Sender<PlayerMsg>,
    playback: PlaybackHandle,
    audio: AudioSettings,
    settings: PlaybackSettings,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("encore-player".to_string())
        .spawn(move || {
            let backend: Box<dyn EngineBackend> = match RodioBackend::open() {
                Ok(backend) => Box::new(backend),
                Err(e) => {
                    warn!(error = %e, "no audio output device");
                    Box::new(UnavailableBackend::new(e.to_string()))
                }
            };
            let controller = PlaybackController::new(backend, tx, playback, &audio, &settings);
            run(controller, rx, Duration::from_millis(audio.tick_ms.max(1)));
        })
}

/// Drive `controller` until `Quit` arrives or every sender is gone.
fn run(mut controller: PlaybackController, rx: Receiver<PlayerMsg>, tick: Duration) {
    controller.publish();
    loop {
        match rx.recv_timeout(tick) {
            Ok(msg) => {
                let keep_going = controller.handle(msg);
                controller.publish();
                if !keep_going {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                controller.tick();
                controller.publish();
            }
            Err(RecvTimeoutError::Disconnected) => {
                controller.teardown();
                controller.publish();
                break;
            }
        }
    }
    info!("player thread exiting");
}
