//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Cell, Clear, Padding, Paragraph, Row, Table, TableState, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::audio::PlayerStatus;
use crate::config::{ControlsSettings, UiSettings};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("0-9", "jump to 0-90%");
    map.insert("-/+", "volume");
    map.insert("m", "mute");
    map.insert("r", "loop one");
    map.insert("s", "stop");
    map.insert("K", "metadata");
    map.insert("o", "open folder");
    map.insert("R", "reload");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_step_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "0-9", "enter", "space/p", "s", "-/+", "m", "r", "gg/G", "K", "o",
        "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] seek -/+{}s", seek_step_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Format a duration, rounding up partial seconds, showing total seconds.
/// Zero means unknown.
fn format_duration_mmss_ceil(d: Duration) -> String {
    if d.is_zero() {
        return "-".to_string();
    }

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn status_label(status: PlayerStatus) -> &'static str {
    match status {
        PlayerStatus::Idle => "Idle",
        PlayerStatus::Loading => "Loading",
        PlayerStatus::Playing => "Playing",
        PlayerStatus::Paused => "Paused",
        PlayerStatus::Stopped => "Stopped",
    }
}

/// The one-paragraph status summary.
fn status_text(app: &App) -> String {
    let snap = &app.snapshot;
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(" {}", status_label(snap.status)));

    if let Some(track) = snap.current_index.and_then(|i| snap.catalog.get(i)) {
        parts.push(format!(
            "Song: {} [{} / {}]",
            track.display,
            format_mmss(snap.position),
            format_mmss(snap.duration)
        ));
    }

    if snap.muted {
        parts.push("MUTED".to_string());
    } else {
        parts.push(format!("VOL: {:.0}%", snap.volume * 100.0));
    }

    parts.push(if snap.loop_one { "Loop-one: ON" } else { "Loop-one: OFF" }.to_string());

    if app.follow_playback {
        parts.push("CURSOR: Follow".to_string());
    } else {
        parts.push("CURSOR: Free-roam".to_string());
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    if let Some(err) = &snap.load_error {
        parts.push(format!("ERROR: {}", err));
    }

    parts.join(" • ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

fn draw_tracks(frame: &mut Frame, app: &App, area: Rect) {
    let catalog = app.tracks();
    if catalog.is_empty() {
        let empty = Paragraph::new("No playable tracks here.\nPress o to open another folder.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" tracks "));
        frame.render_widget(empty, area);
        return;
    }

    // Center the selected row when possible; only build rows for the visible window.
    let total = catalog.len();
    let list_height = area.height.saturating_sub(3) as usize;
    let sel = app.selected.min(total - 1);
    let (start, end) = if total <= list_height || list_height == 0 {
        (0, total)
    } else {
        let half = list_height / 2;
        let mut start = sel.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height)
    };

    let current = app.snapshot.current_index;
    let rows: Vec<Row> = catalog
        .iter()
        .enumerate()
        .skip(start)
        .take(end - start)
        .map(|(i, track)| {
            let marker = if current == Some(i) { "♪" } else { "" };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(track.title.as_str()),
                Cell::from(track.artist.as_str()),
                Cell::from(track.album.as_str()),
                Cell::from(if track.duration.is_zero() {
                    "--:--".to_string()
                } else {
                    format_mmss(track.duration)
                }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Length(5),
        ],
    )
    .header(
        Row::new(vec!["", "Title", "Artist", "Album", "Time"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" tracks "))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(sel - start));
    frame.render_stateful_widget(table, area, &mut state);
}

fn metadata_text(app: &App) -> String {
    let Some(track) = app.selected_track() else {
        return "No track selected".to_string();
    };

    let art = match &track.album_art {
        Some(art) => format!(
            "embedded ({}, {} bytes)",
            art.mime.as_deref().unwrap_or("unknown type"),
            art.data.len()
        ),
        None => "none".to_string(),
    };
    let mut meta = format!(
        "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nFile: {} ({}, {} bytes)\nAlbum art: {}",
        track.title,
        track.artist,
        track.album,
        format_duration_mmss_ceil(track.duration),
        track.file_name(),
        track.source.mime(),
        track.source.len(),
        art,
    );
    if track.degraded {
        meta.push_str("\nTags could not be read; showing file name.");
    }
    meta
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, controls: &ControlsSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .bold()
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    draw_tracks(frame, app, chunks[2]);

    // Overlays stay inside the list area so header/status/footer remain visible.
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(app))
            .block(padded(" metadata (K closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    if let Some(prompt) = &app.prompt {
        let popup_area = centered_rect_sized(72, 3, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let input = Paragraph::new(format!("{}_", prompt))
            .block(padded(" open folder (enter loads, esc cancels) "));
        frame.render_widget(input, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls.seek_step_seconds))
        .block(padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
