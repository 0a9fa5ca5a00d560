use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::{AudioSettings, PlaybackSettings};

use super::thread::spawn_player_thread;
use super::types::{PlaybackHandle, PlaybackSnapshot, PlayerCmd, PlayerMsg};

/// Handle to the player thread, owned by the UI side.
pub struct AudioPlayer {
    tx: Sender<PlayerMsg>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(audio: AudioSettings, settings: PlaybackSettings) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<PlayerMsg>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackSnapshot::default()));

        let handle = spawn_player_thread(rx, tx.clone(), playback.clone(), audio, settings)?;

        Ok(Self {
            tx,
            playback,
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<(), mpsc::SendError<PlayerMsg>> {
        self.tx.send(PlayerMsg::Command(cmd))
    }

    /// Ask the player to tear down and wait for it to finish.
    pub fn shutdown(&self) {
        let _ = self.send(PlayerCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
