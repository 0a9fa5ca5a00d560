use super::*;
use crate::audio::{PlaybackSnapshot, PlayerStatus};
use crate::library::{AudioSource, Track, TrackCatalog, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use std::sync::Arc;
use std::time::Duration;

fn t(name: &str) -> Track {
    Track {
        title: name.into(),
        artist: UNKNOWN_ARTIST.into(),
        album: UNKNOWN_ALBUM.into(),
        duration: Duration::from_secs(60),
        source: AudioSource::new(name.into(), "audio/mpeg".into(), Arc::from(&b"x"[..])),
        album_art: None,
        display: name.into(),
        degraded: false,
    }
}

fn snapshot(names: &[&str], current: Option<usize>) -> PlaybackSnapshot {
    PlaybackSnapshot {
        status: if current.is_some() {
            PlayerStatus::Playing
        } else {
            PlayerStatus::Idle
        },
        current_index: current,
        catalog: Arc::new(TrackCatalog::new(names.iter().map(|n| t(n)).collect())),
        ..PlaybackSnapshot::default()
    }
}

#[test]
fn cursor_wraps_both_ways() {
    let mut app = App::new(false);
    app.sync(snapshot(&["a", "b", "c"], None));

    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.select_last();
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 0);
}

#[test]
fn cursor_on_empty_catalog_stays_put() {
    let mut app = App::new(true);
    app.next();
    app.prev();
    app.select_last();
    assert_eq!(app.selected, 0);
    assert!(app.selected_track().is_none());
    assert!(!app.has_tracks());
}

#[test]
fn sync_follows_the_playing_track() {
    let mut app = App::new(true);
    app.sync(snapshot(&["a", "b", "c"], Some(2)));
    assert_eq!(app.selected, 2);

    app.follow_playback_off();
    app.sync(snapshot(&["a", "b", "c"], Some(0)));
    assert_eq!(app.selected, 2);
}

#[test]
fn pending_follow_waits_for_the_player() {
    let mut app = App::new(true);
    app.sync(snapshot(&["a", "b", "c"], Some(0)));

    app.selected = 2;
    app.set_pending_follow_index(2);
    // Player has not switched yet: keep the cursor where the user put it.
    app.sync(snapshot(&["a", "b", "c"], Some(0)));
    assert_eq!(app.selected, 2);
    assert_eq!(app.pending_follow_index, Some(2));

    app.sync(snapshot(&["a", "b", "c"], Some(2)));
    assert_eq!(app.pending_follow_index, None);

    // From here on, auto-advance moves the cursor again.
    app.sync(snapshot(&["a", "b", "c"], Some(0)));
    assert_eq!(app.selected, 0);
}

#[test]
fn sync_clamps_cursor_to_a_smaller_catalog() {
    let mut app = App::new(false);
    app.sync(snapshot(&["a", "b", "c"], None));
    app.select_last();

    app.sync(snapshot(&["x"], None));
    assert_eq!(app.selected, 0);
    assert_eq!(app.selected_track().unwrap().title, "x");
}

#[test]
fn release_view_drops_the_catalog() {
    let mut app = App::new(true);
    let snap = snapshot(&["a"], Some(0));
    let source = snap.catalog.get(0).unwrap().source.clone();
    app.sync(snap);
    app.toggle_metadata_window();
    assert_eq!(source.handle_count(), 2);

    app.release_view();
    assert_eq!(source.handle_count(), 1);
    assert!(!app.has_tracks());
    assert!(!app.metadata_window);
    assert_eq!(app.status(), PlayerStatus::Idle);
}

#[test]
fn prompt_editing() {
    let mut app = App::new(true);
    app.set_current_dir("/music".into());

    app.open_prompt();
    assert_eq!(app.prompt.as_deref(), Some("/music"));
    app.push_prompt_char('/');
    app.push_prompt_char('x');
    app.pop_prompt_char();
    assert_eq!(app.take_prompt().as_deref(), Some("/music/"));
    assert!(app.prompt.is_none());

    app.open_prompt();
    app.prompt = Some("   ".into());
    assert_eq!(app.take_prompt(), None);

    app.open_prompt();
    app.cancel_prompt();
    assert!(app.prompt.is_none());
    // Editing a closed prompt does nothing.
    app.push_prompt_char('z');
    assert!(app.prompt.is_none());
}
