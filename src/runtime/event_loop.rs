use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{AudioPlayer, PlayerCmd, PlayerStatus};
use crate::config;
use crate::library::{ingest, select_folder};
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Replace the loaded folder with `dir`.
///
/// Every hold on the old catalog is released (ours and the player's) before
/// the new folder is read.
pub fn open_folder(dir: &str, settings: &config::Settings, app: &mut App, audio_player: &AudioPlayer) {
    app.release_view();
    let (ack_tx, ack_rx) = mpsc::channel();
    if audio_player.send(PlayerCmd::ReleaseCatalog(ack_tx)).is_ok() {
        let _ = ack_rx.recv();
    }

    let files = select_folder(Path::new(dir), &settings.library);
    let catalog = ingest(files, &settings.library);
    info!(dir, tracks = catalog.len(), "folder opened");

    app.set_current_dir(dir.to_string());
    if let Err(e) = audio_player.send(PlayerCmd::ReplaceCatalog(catalog)) {
        warn!(error = %e, "player is gone, catalog dropped");
    }
}

/// Main terminal event loop: handles input, UI drawing and sync with the
/// player thread. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let playback = audio_player.playback_handle();
    loop {
        // Clone out of the lock so drawing never holds it.
        let snapshot = playback.lock().ok().map(|s| s.clone());
        if let Some(snapshot) = snapshot {
            app.sync(snapshot);
        }

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, audio_player, state)? {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_prompt_key(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Backspace => app.pop_prompt_char(),
        KeyCode::Enter => {
            if let Some(dir) = app.take_prompt() {
                open_folder(&dir, settings, app, audio_player);
            }
        }
        KeyCode::Char(c) if !c.is_control() => app.push_prompt_char(c),
        _ => {}
    }
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    state: &mut EventLoopState,
) -> Result<bool, Box<dyn std::error::Error>> {
    if app.prompt.is_some() {
        state.pending_gg = false;
        handle_prompt_key(key, settings, app, audio_player);
        return Ok(false);
    }

    let send = |cmd: PlayerCmd| {
        if let Err(e) = audio_player.send(cmd) {
            warn!(error = %e, "player is gone");
        }
    };
    let seek_step = settings.controls.seek_step_seconds.min(i64::MAX as u64) as i64;
    let volume_step = settings.controls.volume_step;

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => {
            audio_player.shutdown();
            return Ok(true);
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => {
            if app.has_tracks() {
                let is_playing_selected = app.status() == PlayerStatus::Playing
                    && app.snapshot.current_index == Some(app.selected);
                if !is_playing_selected {
                    app.follow_playback_on();
                    app.set_pending_follow_index(app.selected);
                    send(PlayerCmd::Select(app.selected));
                }
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            app.follow_playback_on();
            if app.status() == PlayerStatus::Stopped && !app.snapshot.engine_loaded {
                // Nothing loaded yet (autoplay off, or the last load failed).
                if app.has_tracks() {
                    app.set_pending_follow_index(app.selected);
                    send(PlayerCmd::Select(app.selected));
                }
            } else {
                send(PlayerCmd::TogglePause);
            }
        }
        KeyCode::Char('l') => {
            app.follow_playback_on();
            send(PlayerCmd::Next);
        }
        KeyCode::Char('h') => {
            app.follow_playback_on();
            send(PlayerCmd::Prev);
        }
        KeyCode::Char('L') => send(PlayerCmd::SeekBy(seek_step)),
        KeyCode::Char('H') => send(PlayerCmd::SeekBy(-seek_step)),
        KeyCode::Char(c @ '0'..='9') => {
            let tenths = c.to_digit(10).unwrap_or(0);
            send(PlayerCmd::Seek(app.snapshot.duration * tenths / 10));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => send(PlayerCmd::ChangeVolume(volume_step)),
        KeyCode::Char('-') => send(PlayerCmd::ChangeVolume(-volume_step)),
        KeyCode::Char('m') => send(PlayerCmd::ToggleMute),
        KeyCode::Char('r') => send(PlayerCmd::ToggleLoopOne),
        KeyCode::Char('s') => send(PlayerCmd::Stop),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        KeyCode::Char('o') => app.open_prompt(),
        KeyCode::Char('R') => {
            if let Some(dir) = app.current_dir.clone() {
                open_folder(&dir, settings, app, audio_player);
            }
        }
        _ => {}
    }

    Ok(false)
}
