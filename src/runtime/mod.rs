use std::env;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::config;
use crate::logging;

mod event_loop;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    let log_file = logging::init(&settings.logging);
    info!(
        config = ?config::resolve_config_path(),
        log = ?log_file,
        "starting encore"
    );

    let dir = env::args().nth(1).unwrap_or_else(|| {
        env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| ".".to_string())
    });

    let audio_player = AudioPlayer::new(settings.audio.clone(), settings.playback.clone())?;
    let mut app = App::new(settings.ui.follow_playback);
    event_loop::open_folder(&dir, &settings, &mut app, &audio_player);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(&mut terminal, &settings, &mut app, &audio_player, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    audio_player.shutdown();
    info!("bye");
    run_result
}
