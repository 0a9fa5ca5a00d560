use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::engine::PositionProbe;
use super::types::{EngineEvent, EventSink};

/// Periodically reports an engine's position while it plays.
///
/// At most one exists per controller. Cancelling (or dropping) stops the
/// thread and waits for it, so no sample from it arrives afterwards.
pub struct PositionSampler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PositionSampler {
    pub fn start(
        probe: PositionProbe,
        events: EventSink,
        epoch: u64,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("encore-sampler".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let position = probe();
                            if !events.emit(EngineEvent::Position { epoch, position }) {
                                break;
                            }
                        }
                        // Explicit stop or sender dropped.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PositionSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
