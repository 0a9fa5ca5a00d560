//! Per-file metadata extraction.
//!
//! Tags are read with `lofty` from an in-memory cursor over the file bytes.
//! A file whose tags cannot be read still produces a track, built from the
//! file name and defaults, so one bad file never sinks a whole folder.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use lofty::error::LoftyError;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::probe::Probe;
use lofty::tag::Accessor;
use tracing::{debug, warn};

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::{AlbumArt, AudioSource, SelectedFile, Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST};

/// Whatever the tags told us. Every field is optional.
#[derive(Debug, Default)]
struct TagInfo {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<Duration>,
    album_art: Option<AlbumArt>,
}

/// Turn one selected file into a `Track`. Never fails.
pub fn extract(file: SelectedFile, settings: &LibrarySettings) -> Track {
    let SelectedFile { name, bytes, mime } = file;
    let bytes: Arc<[u8]> = bytes.into();

    let (info, degraded) = match read_tags(&bytes) {
        Ok(info) => (info, false),
        Err(e) => {
            warn!(file = %name, error = %e, "failed to read metadata, using file name");
            (TagInfo::default(), true)
        }
    };

    let title = info.title.unwrap_or_else(|| name.clone());
    let artist = info.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let album = info.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
    let display = display_from_fields(
        &name,
        &title,
        &artist,
        &album,
        &settings.display_fields,
        &settings.display_separator,
    );

    Track {
        title,
        artist,
        album,
        duration: info.duration.unwrap_or(Duration::ZERO),
        source: AudioSource::new(name, mime, bytes),
        album_art: info.album_art,
        display,
        degraded,
    }
}

fn read_tags(bytes: &Arc<[u8]>) -> Result<TagInfo, LoftyError> {
    let tagged = Probe::new(Cursor::new(&bytes[..]))
        .guess_file_type()?
        .read()?;

    let mut info = TagInfo {
        duration: Some(tagged.properties().duration()),
        ..TagInfo::default()
    };

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        debug!("no tags found");
        return Ok(info);
    };

    info.title = non_blank(tag.title().as_deref());
    info.artist = non_blank(tag.artist().as_deref());
    info.album = non_blank(tag.album().as_deref());

    // Prefer the front cover, otherwise whatever picture comes first.
    let pictures = tag.pictures();
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first());
    info.album_art = picture
        .filter(|p| !p.data().is_empty())
        .map(|p| AlbumArt {
            mime: p.mime_type().map(|m| m.as_str().to_string()),
            data: Arc::from(p.data()),
        });

    Ok(info)
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
