use std::fs;
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::SelectedFile;

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Declared MIME type for a file name, going by its extension.
pub fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Read every regular file under `dir` into memory, in file-name order.
///
/// This plays the part of a folder picker: nothing is filtered by type here,
/// that is the ingestor's job. Entries that cannot be read are skipped.
pub fn select_folder(dir: &Path, settings: &LibrarySettings) -> Vec<SelectedFile> {
    let mut files: Vec<SelectedFile> = Vec::new();

    let mut walker = WalkDir::new(dir)
        .follow_links(settings.follow_links)
        .sort_by_file_name();

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable folder entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        match fs::read(entry.path()) {
            Ok(bytes) => {
                let mime = mime_for(&name);
                files.push(SelectedFile::new(name, bytes, mime));
            }
            Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to read file"),
        }
    }

    files
}
