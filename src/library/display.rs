use crate::config::TrackDisplayField;

/// Build the list label for a track from the configured `fields`.
///
/// Blank parts are skipped; when nothing is left the file name is used.
pub fn display_from_fields(
    file_name: &str,
    title: &str,
    artist: &str,
    album: &str,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let parts: Vec<&str> = fields
        .iter()
        .map(|f| match f {
            TrackDisplayField::Title => title,
            TrackDisplayField::Artist => artist,
            TrackDisplayField::Album => album,
            TrackDisplayField::Filename => file_name,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        file_name.to_string()
    } else {
        parts.join(sep)
    }
}
