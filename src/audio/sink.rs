//! `rodio`-backed engines.
//!
//! Each engine owns one `Sink` fed by a `Decoder` over the track's in-memory
//! bytes. Seeking rebuilds the sink with `skip_duration`, which works for
//! every format the decoder understands.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::library::{AudioSource, Track};

use super::engine::{EngineBackend, PlaybackEngine, PositionProbe};
use super::types::{EngineEvent, EventSink, LoadError};

/// Owns the output stream; engines connect to its mixer.
pub struct RodioBackend {
    stream: OutputStream,
}

impl RodioBackend {
    pub fn open() -> Result<Self, rodio::StreamError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped, which would
        // scribble over the TUI.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl EngineBackend for RodioBackend {
    fn load(&mut self, track: &Track, events: EventSink) {
        let mixer = self.stream.mixer().clone();
        let source = track.source.clone();
        let fallback = Some(track.duration).filter(|d| !d.is_zero());
        let on_spawn_error = events.clone();

        let spawned = thread::Builder::new()
            .name("encore-loader".to_string())
            .spawn(move || {
                let event = match RodioEngine::prepare(mixer, source, fallback, events.clone()) {
                    Ok(engine) => EngineEvent::Ready(Box::new(engine)),
                    Err(e) => EngineEvent::LoadFailed(e),
                };
                events.emit(event);
            });

        if let Err(source) = spawned {
            on_spawn_error.emit(EngineEvent::LoadFailed(LoadError::Spawn {
                file: track.file_name().to_string(),
                source,
            }));
        }
    }
}

/// The sink currently producing sound and where in the track it started.
struct Output {
    sink: Sink,
    offset: Duration,
}

impl Output {
    fn position(&self) -> Duration {
        self.offset + self.sink.get_pos()
    }
}

pub struct RodioEngine {
    mixer: Mixer,
    source: AudioSource,
    output: Arc<Mutex<Output>>,
    duration: Option<Duration>,
    volume: f32,
    playing: bool,
    events: EventSink,
}

impl RodioEngine {
    fn prepare(
        mixer: Mixer,
        source: AudioSource,
        fallback: Option<Duration>,
        events: EventSink,
    ) -> Result<Self, LoadError> {
        let (sink, duration) = open_sink(&mixer, &source, Duration::ZERO)?;
        debug!(file = source.file_name(), ?duration, "prepared sink");
        Ok(Self {
            mixer,
            source,
            output: Arc::new(Mutex::new(Output {
                sink,
                offset: Duration::ZERO,
            })),
            duration: duration.or(fallback),
            volume: 1.0,
            playing: false,
            events,
        })
    }

    /// Swap in a fresh sink starting at `start_at`, keeping play state and volume.
    fn rebuild_at(&mut self, start_at: Duration) -> Result<(), LoadError> {
        let (sink, _) = open_sink(&self.mixer, &self.source, start_at)?;
        sink.set_volume(self.volume);
        if self.playing {
            sink.play();
        }
        if let Ok(mut out) = self.output.lock() {
            out.sink.stop();
            out.sink = sink;
            out.offset = start_at;
        }
        Ok(())
    }

    fn with_sink(&self, f: impl FnOnce(&Sink)) {
        if let Ok(out) = self.output.lock() {
            f(&out.sink);
        }
    }
}

impl PlaybackEngine for RodioEngine {
    fn play(&mut self) {
        self.with_sink(Sink::play);
        self.playing = true;
        self.events.emit(EngineEvent::Play);
    }

    fn pause(&mut self) {
        self.with_sink(Sink::pause);
        self.playing = false;
        self.events.emit(EngineEvent::Pause);
    }

    fn stop(&mut self) {
        self.playing = false;
        if let Err(e) = self.rebuild_at(Duration::ZERO) {
            // Keep the old sink, just silenced.
            debug!(error = %e, "could not rewind on stop");
            self.with_sink(Sink::pause);
        }
        self.events.emit(EngineEvent::Stop);
    }

    fn seek(&mut self, position: Duration) {
        if let Err(e) = self.rebuild_at(position) {
            warn!(error = %e, "seek failed");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.with_sink(|s| s.set_volume(volume));
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.output
            .lock()
            .map(|out| out.sink.empty())
            .unwrap_or(false)
    }

    fn position_probe(&self) -> PositionProbe {
        let output = Arc::clone(&self.output);
        Arc::new(move || {
            output
                .lock()
                .map(|out| out.position())
                .unwrap_or(Duration::ZERO)
        })
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.with_sink(Sink::stop);
    }
}

/// Build a decoder over the in-memory bytes.
///
/// The reader is a cursor, so it is seekable and its length is known. mp4
/// files with the `moov` atom after `mdat` only decode when both are set,
/// and mp3 needs the length for a total duration.
fn decoder_for(source: &AudioSource) -> Result<Decoder<Cursor<Arc<[u8]>>>, LoadError> {
    let mut builder = Decoder::builder()
        .with_data(source.reader())
        .with_byte_len(source.len() as u64)
        .with_seekable(true);
    if let Some((_, ext)) = source.file_name().rsplit_once('.') {
        builder = builder.with_hint(&ext.to_ascii_lowercase());
    }
    if source.mime().starts_with("audio/") {
        builder = builder.with_mime_type(source.mime());
    }
    builder.build().map_err(|e| LoadError::Decode {
        file: source.file_name().to_string(),
        source: e,
    })
}

/// Create a paused `Sink` for `source` that starts playback at `start_at`.
fn open_sink(
    mixer: &Mixer,
    source: &AudioSource,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), LoadError> {
    let decoder = decoder_for(source)?;
    let duration = decoder.total_duration();

    let sink = Sink::connect_new(mixer);
    sink.pause();
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    sink.append(decoder.skip_duration(start_at));
    Ok((sink, duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tests::wav_bytes;

    fn source(name: &str, mime: &str, bytes: Vec<u8>) -> AudioSource {
        AudioSource::new(name.to_string(), mime.to_string(), Arc::from(bytes))
    }

    #[test]
    fn decoder_reports_total_duration_from_memory() {
        let decoder = decoder_for(&source("tone.wav", "audio/wav", wav_bytes(2))).unwrap();
        let ms = decoder.total_duration().unwrap().as_millis();
        assert!((1990..=2010).contains(&ms), "duration was {ms}ms");
    }

    #[test]
    fn decoder_accepts_missing_or_uppercase_hints() {
        let bytes = wav_bytes(1);
        assert!(decoder_for(&source("noext", "application/octet-stream", bytes.clone())).is_ok());
        assert!(decoder_for(&source("tone.WAV", "audio/wav", bytes)).is_ok());
    }

    #[test]
    fn undecodable_bytes_name_the_file() {
        let err = decoder_for(&source("bad.mp3", "audio/mpeg", b"not audio".to_vec()))
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Decode { ref file, .. } if file == "bad.mp3"));
    }
}
