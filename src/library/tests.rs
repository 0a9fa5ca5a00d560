use std::fs;
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::picture::{Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt, TagType};
use tempfile::tempdir;

use super::display::display_from_fields;
use super::extract::extract;
use super::ingest::is_supported;
use super::scan::mime_for;
use super::*;
use crate::config::{LibrarySettings, TrackDisplayField};

/// A minimal PCM WAV file: 8 kHz, mono, 16-bit, `secs` seconds of silence.
pub(crate) fn wav_bytes(secs: u32) -> Vec<u8> {
    let sample_rate: u32 = 8000;
    let channels: u16 = 1;
    let bits: u16 = 16;
    let block_align = channels * bits / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = byte_rate * secs;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

fn file(name: &str, bytes: &[u8]) -> SelectedFile {
    SelectedFile::new(name, bytes.to_vec(), mime_for(name))
}

#[test]
fn display_from_fields_joins_non_blank_parts() {
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];
    assert_eq!(
        display_from_fields("a.mp3", "Song", "Artist", "Album", &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields("a.mp3", "Song", "  ", "Album", &fields, " - "),
        "Song"
    );
    assert_eq!(
        display_from_fields("a.mp3", "", "", "Album", &fields, " - "),
        "a.mp3"
    );
    assert_eq!(
        display_from_fields(
            "a.mp3",
            "Song",
            "Artist",
            "Album",
            &[TrackDisplayField::Album, TrackDisplayField::Filename],
            "::"
        ),
        "Album::a.mp3"
    );
}

#[test]
fn is_supported_matches_configured_extensions_case_insensitive() {
    let settings = LibrarySettings::default();
    for name in ["a.mp3", "a.MP3", "a.wav", "a.Ogg", "a.flac", "a.M4A", ".mp3"] {
        assert!(is_supported(&file(name, b""), &settings), "{name}");
    }
    for name in ["a.txt", "a", "mp3", "a.mp3.bak", "a."] {
        assert!(!is_supported(&file(name, b""), &settings), "{name}");
    }
    // A bare extension is still a supported file name.
    assert_eq!(ingest(vec![file(".mp3", b"junk")], &settings).len(), 1);

    let dotted = LibrarySettings {
        extensions: vec![".OPUS".into()],
        ..LibrarySettings::default()
    };
    assert!(is_supported(&file("x.opus", b""), &dotted));
    assert!(!is_supported(&file("x.mp3", b""), &dotted));
}

#[test]
fn extract_reads_duration_from_a_valid_file() {
    let track = extract(file("tone.wav", &wav_bytes(2)), &LibrarySettings::default());

    assert!(!track.degraded);
    let ms = track.duration.as_millis();
    assert!((1990..=2010).contains(&ms), "duration was {ms}ms");
    // No tags in a bare WAV: names come from defaults.
    assert_eq!(track.title, "tone.wav");
    assert_eq!(track.artist, UNKNOWN_ARTIST);
    assert_eq!(track.album, UNKNOWN_ALBUM);
    assert!(track.album_art.is_none());
    assert_eq!(track.source.mime(), "audio/wav");
}

/// `wav_bytes(secs)` with an ID3v2 chunk carrying the given tag, written
/// by lofty through a temp file.
fn tagged_wav(secs: u32, tag: &Tag) -> Vec<u8> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tagged.wav");
    fs::write(&path, wav_bytes(secs)).unwrap();
    tag.save_to_path(&path, WriteOptions::default()).unwrap();
    fs::read(&path).unwrap()
}

fn picture(pic_type: PictureType, bytes: &[u8]) -> Picture {
    let mut picture = Picture::from_reader(&mut &bytes[..]).unwrap();
    picture.set_pic_type(pic_type);
    picture
}

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n-png-data";
const JPEG: &[u8] = b"\xff\xd8\xff\xe0-jpeg-data";

#[test]
fn extract_prefers_tag_fields_and_the_front_cover() {
    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title("  Real Title ".to_string());
    tag.set_artist("Real Artist".to_string());
    tag.set_album("   ".to_string());
    tag.push_picture(picture(PictureType::Other, PNG));
    tag.push_picture(picture(PictureType::CoverFront, JPEG));

    let track = extract(file("song.wav", &tagged_wav(1, &tag)), &LibrarySettings::default());

    assert!(!track.degraded);
    assert_eq!(track.title, "Real Title");
    assert_eq!(track.artist, "Real Artist");
    // Blank tag values fall back like missing ones.
    assert_eq!(track.album, UNKNOWN_ALBUM);
    assert_eq!(track.display, "Real Artist - Real Title");
    assert_eq!(track.duration.as_secs(), 1);

    let art = track.album_art.expect("front cover");
    assert_eq!(art.mime.as_deref(), Some("image/jpeg"));
    assert_eq!(&art.data[..], JPEG);
}

#[test]
fn extract_falls_back_to_the_first_picture() {
    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title("Only Art".to_string());
    tag.push_picture(picture(PictureType::Other, PNG));

    let track = extract(file("art.wav", &tagged_wav(1, &tag)), &LibrarySettings::default());

    assert_eq!(track.title, "Only Art");
    assert_eq!(track.artist, UNKNOWN_ARTIST);
    let art = track.album_art.expect("fallback picture");
    assert_eq!(art.mime.as_deref(), Some("image/png"));
    assert_eq!(&art.data[..], PNG);
}

#[test]
fn extract_degrades_on_unparseable_bytes() {
    let track = extract(
        file("broken.mp3", b"definitely not an mp3"),
        &LibrarySettings::default(),
    );

    assert!(track.degraded);
    assert_eq!(track.title, "broken.mp3");
    assert_eq!(track.artist, "Unknown Artist");
    assert_eq!(track.album, "Unknown Album");
    assert_eq!(track.duration, Duration::ZERO);
    assert!(track.album_art.is_none());
    assert_eq!(track.file_name(), "broken.mp3");
    assert_eq!(track.source.len(), b"definitely not an mp3".len());
    assert_eq!(track.display, "Unknown Artist - broken.mp3");
}

#[test]
fn ingest_keeps_supported_files_in_selection_order() {
    let files = vec![
        file("c.wav", &wav_bytes(1)),
        file("notes.txt", b"ignore me"),
        file("a.MP3", b"junk"),
        file("cover.jpg", b"\xff\xd8\xff"),
        file("b.ogg", b"junk"),
    ];

    let catalog = ingest(files, &LibrarySettings::default());
    let names: Vec<&str> = catalog.iter().map(|t| t.file_name()).collect();
    assert_eq!(names, vec!["c.wav", "a.MP3", "b.ogg"]);
}

#[test]
fn ingest_length_matches_supported_count() {
    let settings = LibrarySettings::default();
    let files = vec![
        file("1.mp3", b""),
        file("2.flac", b""),
        file("3.m4a", b""),
        file("4.doc", b""),
        file("5", b""),
    ];
    let expected = files.iter().filter(|f| is_supported(f, &settings)).count();

    assert_eq!(ingest(files, &settings).len(), expected);
    assert_eq!(expected, 3);
}

#[test]
fn ingest_mixes_good_and_corrupt_entries() {
    let files = vec![
        file("one.wav", &wav_bytes(1)),
        file("two.wav", &wav_bytes(1)),
        file("bad.flac", b"fLaC but not really"),
        file("three.wav", &wav_bytes(1)),
    ];

    let catalog = ingest(files, &LibrarySettings::default());
    assert_eq!(catalog.len(), 4);

    let bad = catalog.get(2).unwrap();
    assert!(bad.degraded);
    assert_eq!(bad.title, "bad.flac");
    assert_eq!(bad.duration, Duration::ZERO);

    for i in [0, 1, 3] {
        let t = catalog.get(i).unwrap();
        assert!(!t.degraded);
        assert!(t.duration > Duration::ZERO);
    }
}

#[test]
fn ingest_of_nothing_is_an_empty_catalog() {
    let settings = LibrarySettings::default();
    assert!(ingest(Vec::new(), &settings).is_empty());
    assert!(ingest(vec![file("readme.md", b"# hi")], &settings).is_empty());
}

#[test]
fn dropping_the_catalog_releases_source_handles() {
    let catalog = ingest(
        vec![file("a.wav", &wav_bytes(1))],
        &LibrarySettings::default(),
    );
    let source = catalog.get(0).unwrap().source.clone();
    assert_eq!(source.handle_count(), 2);

    drop(catalog);
    assert_eq!(source.handle_count(), 1);
}

#[test]
fn mime_for_maps_known_extensions() {
    assert_eq!(mime_for("a.mp3"), "audio/mpeg");
    assert_eq!(mime_for("a.WAV"), "audio/wav");
    assert_eq!(mime_for("a.ogg"), "audio/ogg");
    assert_eq!(mime_for("a.flac"), "audio/flac");
    assert_eq!(mime_for("a.m4a"), "audio/mp4");
    assert_eq!(mime_for("a.txt"), "application/octet-stream");
    assert_eq!(mime_for("noext"), "application/octet-stream");
}

#[test]
fn select_folder_reads_files_sorted_by_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let files = select_folder(dir.path(), &LibrarySettings::default());
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["A.ogg", "b.MP3", "c.txt"]);
    assert_eq!(files[1].bytes, b"not a real mp3");
    assert_eq!(files[1].mime, "audio/mpeg");

    let catalog = ingest(files, &LibrarySettings::default());
    assert_eq!(catalog.len(), 2);
}

#[test]
fn select_folder_skips_hidden_unless_configured() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"x").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"x").unwrap();

    let files = select_folder(dir.path(), &LibrarySettings::default());
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "visible.mp3");

    let settings = LibrarySettings {
        include_hidden: true,
        ..LibrarySettings::default()
    };
    assert_eq!(select_folder(dir.path(), &settings).len(), 2);
}

#[test]
fn select_folder_respects_recursion_settings() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"x").unwrap();
    fs::write(d1.join("one.mp3"), b"x").unwrap();
    fs::write(d2.join("two.mp3"), b"x").unwrap();

    let names = |settings: &LibrarySettings| -> Vec<String> {
        select_folder(dir.path(), settings)
            .into_iter()
            .map(|f| f.name)
            .collect()
    };

    let flat = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    assert_eq!(names(&flat), vec!["root.mp3"]);

    // WalkDir depth counts root as 0, children as 1, grandchildren as 2.
    let capped = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    let got = names(&capped);
    assert!(got.contains(&"root.mp3".to_string()));
    assert!(got.contains(&"one.mp3".to_string()));
    assert!(!got.contains(&"two.mp3".to_string()));

    assert_eq!(names(&LibrarySettings::default()).len(), 3);
}

#[test]
fn select_folder_on_missing_dir_is_empty() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(select_folder(&missing, &LibrarySettings::default()).is_empty());
}
