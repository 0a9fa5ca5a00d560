use tracing::{debug, info};

use crate::config::LibrarySettings;

use super::extract::extract;
use super::model::{SelectedFile, TrackCatalog};

/// Returns true when `file` carries one of the configured audio extensions.
pub(crate) fn is_supported(file: &SelectedFile, settings: &LibrarySettings) -> bool {
    let Some(ext) = file.extension() else {
        return false;
    };
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(&ext))
}

/// Build a catalog from a selection, keeping selection order.
///
/// Unsupported files are dropped; unreadable tags yield degraded entries.
pub fn ingest(files: Vec<SelectedFile>, settings: &LibrarySettings) -> TrackCatalog {
    let total = files.len();
    let tracks: Vec<_> = files
        .into_iter()
        .filter(|f| {
            let keep = is_supported(f, settings);
            if !keep {
                debug!(file = %f.name, "skipping unsupported file");
            }
            keep
        })
        .map(|f| extract(f, settings))
        .collect();

    let degraded = tracks.iter().filter(|t| t.degraded).count();
    info!(
        selected = total,
        tracks = tracks.len(),
        degraded,
        "ingested selection"
    );

    TrackCatalog::new(tracks)
}
