//! `SynthEngine` implementation over `rustysynth`.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use patchplay_core::{DecodeOptions, SampleFormat, SynthEngine, VirtualFs, CONFIG_PATH};
use rustysynth::{MidiFile, MidiFileSequencer, SoundFont, Synthesizer, SynthesizerSettings};
use tracing::{debug, info, warn};

use crate::config::SynthConfig;
use crate::encode::encode_frames;
use crate::fs::MemFs;

/// `init` status codes.
pub mod status {
    pub const OK: i32 = 0;
    pub const CONFIG_MISSING: i32 = 1;
    pub const CONFIG_NOT_UTF8: i32 = 2;
    pub const NO_SOUNDFONT: i32 = 3;
}

/// One constructed song.
///
/// When the soundfont was not available at construction time the handle
/// carries no sequencer, only the missing name.
pub struct SoundFontSong {
    midi: Arc<MidiFile>,
    sequencer: Option<MidiFileSequencer>,
    missing: Vec<String>,
    format: SampleFormat,
    channels: u16,
    sample_rate: u32,
    total_frames: usize,
    rendered: usize,
    started: bool,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SoundFontSong {
    const fn frames_to_ms(&self, frames: usize) -> u32 {
        (frames as u64 * 1000 / self.sample_rate as u64) as u32
    }
}

/// SoundFont synthesizer reading its configuration and soundfonts from a
/// [`MemFs`].
#[derive(Default)]
pub struct SoundFontEngine {
    fs: MemFs,
    soundfont: Option<String>,
    /// Parsed soundfonts keyed by filesystem path.
    cache: HashMap<String, Arc<SoundFont>>,
}

impl SoundFontEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name of the configured soundfont, once initialised.
    pub fn soundfont_name(&self) -> Option<&str> {
        self.soundfont.as_deref()
    }

    fn load_soundfont(&mut self, name: &str) -> Option<Option<Arc<SoundFont>>> {
        let path = format!("/{name}");
        if let Some(font) = self.cache.get(&path) {
            return Some(Some(Arc::clone(font)));
        }

        let bytes = self.fs.read_file(&path)?;
        let font = match SoundFont::new(&mut Cursor::new(bytes)) {
            Ok(font) => Arc::new(font),
            Err(e) => {
                warn!("Failed to parse soundfont {path}: {e:?}");
                return Some(None);
            }
        };
        info!("Loaded soundfont {path}");
        self.cache.insert(path, Arc::clone(&font));
        Some(Some(font))
    }
}

impl SynthEngine for SoundFontEngine {
    type Fs = MemFs;
    type Options = DecodeOptions;
    type Stream = Cursor<Vec<u8>>;
    type Song = SoundFontSong;

    fn fs(&self) -> &MemFs {
        &self.fs
    }

    fn fs_mut(&mut self) -> &mut MemFs {
        &mut self.fs
    }

    fn init(&mut self) -> i32 {
        let Some(bytes) = self.fs.read_file(CONFIG_PATH) else {
            return status::CONFIG_MISSING;
        };
        let Ok(text) = std::str::from_utf8(bytes) else {
            return status::CONFIG_NOT_UTF8;
        };

        let config = SynthConfig::parse(text);
        let Some(name) = config.soundfont_name() else {
            return status::NO_SOUNDFONT;
        };

        debug!("Configured soundfont {name}");
        self.soundfont = Some(name);
        self.cache.clear();
        status::OK
    }

    fn alloc_options(&mut self, options: DecodeOptions) -> DecodeOptions {
        options
    }

    fn free_options(&mut self, _options: DecodeOptions) {}

    fn open_stream(&mut self, data: &[u8]) -> Cursor<Vec<u8>> {
        Cursor::new(data.to_vec())
    }

    fn close_stream(&mut self, _stream: Cursor<Vec<u8>>) {}

    fn load_song(
        &mut self,
        stream: &mut Cursor<Vec<u8>>,
        options: &DecodeOptions,
    ) -> Option<SoundFontSong> {
        let Some(name) = self.soundfont.clone() else {
            warn!("Engine used before init");
            return None;
        };
        if options.sample_rate == 0 || options.channels == 0 {
            return None;
        }

        let midi = match MidiFile::new(stream) {
            Ok(midi) => Arc::new(midi),
            Err(e) => {
                warn!("Failed to parse MIDI data: {e:?}");
                return None;
            }
        };

        let total_frames = (midi.get_length() * f64::from(options.sample_rate)).ceil() as usize;
        let mut song = SoundFontSong {
            midi,
            sequencer: None,
            missing: Vec::new(),
            format: options.format,
            channels: options.channels,
            sample_rate: options.sample_rate,
            total_frames,
            rendered: 0,
            started: false,
            left: Vec::new(),
            right: Vec::new(),
        };

        let font = match self.load_soundfont(&name) {
            None => {
                debug!("Soundfont {name} not present yet");
                song.missing.push(name);
                return Some(song);
            }
            Some(None) => return None,
            Some(Some(font)) => font,
        };

        let settings = SynthesizerSettings::new(options.sample_rate as i32);
        let synthesizer = match Synthesizer::new(&font, &settings) {
            Ok(synthesizer) => synthesizer,
            Err(e) => {
                warn!("Failed to create synthesizer: {e:?}");
                return None;
            }
        };

        song.sequencer = Some(MidiFileSequencer::new(synthesizer));
        song.left = vec![0.0; options.buffer_size];
        song.right = vec![0.0; options.buffer_size];
        Some(song)
    }

    fn load_request_count(&self, song: &SoundFontSong) -> usize {
        song.missing.len()
    }

    fn load_request(&self, song: &SoundFontSong, index: usize) -> Option<String> {
        song.missing.get(index).cloned()
    }

    fn start_song(&mut self, song: &mut SoundFontSong) {
        let midi = Arc::clone(&song.midi);
        if let Some(sequencer) = song.sequencer.as_mut() {
            sequencer.play(&midi, false);
            song.started = true;
        }
    }

    fn song_time(&self, song: &SoundFontSong) -> u32 {
        song.frames_to_ms(song.rendered)
    }

    fn song_total_time(&self, song: &SoundFontSong) -> u32 {
        song.frames_to_ms(song.total_frames)
    }

    fn read_wave(&mut self, song: &mut SoundFontSong, buffer: &mut [u8]) -> usize {
        if !song.started {
            return 0;
        }
        let Some(sequencer) = song.sequencer.as_mut() else {
            return 0;
        };

        let frame_bytes = song.format.bytes_per_sample(song.channels);
        let frames = (buffer.len() / frame_bytes).min(song.total_frames - song.rendered);
        if frames == 0 {
            return 0;
        }
        if song.left.len() < frames {
            song.left.resize(frames, 0.0);
            song.right.resize(frames, 0.0);
        }

        let (left, right) = (&mut song.left[..frames], &mut song.right[..frames]);
        sequencer.render(left, right);
        song.rendered += frames;
        encode_frames(song.format, song.channels, left, right, buffer)
    }

    fn free_song(&mut self, song: SoundFontSong) {
        debug!("Freeing song after {} frames", song.rendered);
    }
}
