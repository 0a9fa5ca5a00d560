use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// One user-selected file as handed over by the selection collaborator.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime: mime.into(),
        }
    }

    /// Lowercased extension of `name`, without the dot.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Playable handle: owns the file bytes for as long as the track lives.
///
/// Cloning is cheap; the bytes are shared and freed once the last clone
/// (catalog entry, loader thread, decoder) is dropped.
#[derive(Clone)]
pub struct AudioSource {
    file_name: String,
    mime: String,
    bytes: Arc<[u8]>,
}

impl AudioSource {
    pub fn new(file_name: String, mime: String, bytes: Arc<[u8]>) -> Self {
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A fresh seekable reader over the shared bytes.
    pub fn reader(&self) -> Cursor<Arc<[u8]>> {
        Cursor::new(Arc::clone(&self.bytes))
    }

    /// Number of live handles to the underlying bytes.
    #[cfg(test)]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.bytes)
    }
}

impl std::fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSource")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Embedded cover image.
#[derive(Clone)]
pub struct AlbumArt {
    pub mime: Option<String>,
    pub data: Arc<[u8]>,
}

impl std::fmt::Debug for AlbumArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlbumArt")
            .field("mime", &self.mime)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: Duration,
    pub source: AudioSource,
    pub album_art: Option<AlbumArt>,
    pub display: String,
    /// Set when the tags could not be read and every field came from defaults.
    pub degraded: bool,
}

impl Track {
    pub fn file_name(&self) -> &str {
        self.source.file_name()
    }
}

/// Ordered, fixed-length list of tracks in file-selection order.
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }
}
