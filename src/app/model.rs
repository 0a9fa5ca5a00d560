//! UI-side state: the cursor, the folder prompt and the latest playback
//! snapshot published by the player thread.

use crate::audio::{PlaybackSnapshot, PlayerStatus};
use crate::library::{Track, TrackCatalog};

/// The main application model.
pub struct App {
    /// Last snapshot read from the player; also carries the catalog.
    pub snapshot: PlaybackSnapshot,
    pub selected: usize,

    pub follow_playback: bool,
    pub pending_follow_index: Option<usize>,

    pub current_dir: Option<String>,
    pub metadata_window: bool,
    /// Folder path being typed after `o`, if the prompt is open.
    pub prompt: Option<String>,
}

impl App {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            snapshot: PlaybackSnapshot::default(),
            selected: 0,
            follow_playback,
            pending_follow_index: None,
            current_dir: None,
            metadata_window: false,
            prompt: None,
        }
    }

    pub fn tracks(&self) -> &TrackCatalog {
        &self.snapshot.catalog
    }

    pub fn has_tracks(&self) -> bool {
        !self.snapshot.catalog.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.snapshot.catalog.get(self.selected)
    }

    pub fn status(&self) -> PlayerStatus {
        self.snapshot.status
    }

    /// Take in a fresh snapshot and move the cursor to the playing track
    /// when following.
    pub fn sync(&mut self, snapshot: PlaybackSnapshot) {
        self.snapshot = snapshot;

        let len = self.snapshot.catalog.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }

        let Some(idx) = self.snapshot.current_index else {
            return;
        };
        if !self.follow_playback {
            return;
        }
        if let Some(pending) = self.pending_follow_index {
            // Wait until the player has caught up with the last selection.
            if pending == idx {
                self.clear_pending_follow_index();
                self.selected = idx;
            }
        } else {
            self.selected = idx;
        }
    }

    /// Forget the snapshot so this side holds no reference to the catalog.
    pub fn release_view(&mut self) {
        self.snapshot = PlaybackSnapshot::default();
        self.selected = 0;
        self.pending_follow_index = None;
        self.metadata_window = false;
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
        self.pending_follow_index = None;
    }

    pub fn set_pending_follow_index(&mut self, idx: usize) {
        self.pending_follow_index = Some(idx);
    }

    pub fn clear_pending_follow_index(&mut self) {
        self.pending_follow_index = None;
    }

    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        let len = self.snapshot.catalog.len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        let len = self.snapshot.catalog.len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.snapshot.catalog.len().saturating_sub(1);
    }

    pub fn open_prompt(&mut self) {
        self.prompt = Some(self.current_dir.clone().unwrap_or_default());
    }

    pub fn push_prompt_char(&mut self, c: char) {
        if let Some(p) = self.prompt.as_mut() {
            p.push(c);
        }
    }

    pub fn pop_prompt_char(&mut self) {
        if let Some(p) = self.prompt.as_mut() {
            p.pop();
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Close the prompt, returning the entered path unless it is blank.
    pub fn take_prompt(&mut self) -> Option<String> {
        self.prompt
            .take()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
    }
}
