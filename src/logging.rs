//! File-backed `tracing` setup.
//!
//! The terminal belongs to the TUI, so events go to a log file instead.
//! `RUST_LOG` overrides the configured level.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// `$XDG_STATE_HOME/encore/encore.log`, else `~/.local/state/encore/encore.log`.
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("encore").join("encore.log"));
    }
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("encore")
            .join("encore.log"),
    )
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns the log file in use, or `None`
/// when it could not be opened (logging is then off).
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(default_log_path)?;
    let file = match open_log(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("encore: logging disabled, cannot open {}: {e}", path.display());
            return None;
        }
    };

    let installed = tracing_subscriber::registry()
        .with(filter_for(&settings.level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();

    installed.ok().map(|_| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_log_creates_missing_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("encore.log");

        open_log(&path).unwrap();
        assert!(path.is_file());
    }
}
