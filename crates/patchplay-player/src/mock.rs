//! Scripted engine for player tests.

use patchplay_core::{DecodeOptions, SampleFormat, SynthEngine, VirtualFs, CONFIG_PATH};
use patchplay_synth::MemFs;

pub struct MockSong {
    missing: Vec<String>,
    format: SampleFormat,
    channels: u16,
    sample_rate: u32,
    position: usize,
    started: bool,
}

/// Counts every allocation so tests can check nothing leaks.
pub struct MockEngine {
    fs: MemFs,
    init_status: i32,
    required: Vec<String>,
    reject: bool,
    total_frames: usize,
    pub init_calls: usize,
    pub live_options: usize,
    pub live_streams: usize,
    pub live_songs: usize,
    pub load_attempts: usize,
    pub freed_songs: usize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            fs: MemFs::new(),
            init_status: 0,
            required: Vec::new(),
            reject: false,
            total_frames: 0,
            init_calls: 0,
            live_options: 0,
            live_streams: 0,
            live_songs: 0,
            load_attempts: 0,
            freed_songs: 0,
        }
    }

    pub fn with_init_status(mut self, status: i32) -> Self {
        self.init_status = status;
        self
    }

    /// Songs report each name as missing until `/<name>` exists.
    pub fn requiring(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn with_frames(mut self, frames: usize) -> Self {
        self.total_frames = frames;
        self
    }

    fn encode(format: SampleFormat, value: u16, out: &mut [u8]) {
        match format.bytes_per_channel() {
            1 => out[0] = value as u8,
            _ if format.is_big_endian() => out.copy_from_slice(&value.to_be_bytes()),
            _ => out.copy_from_slice(&value.to_le_bytes()),
        }
    }
}

impl SynthEngine for MockEngine {
    type Fs = MemFs;
    type Options = DecodeOptions;
    type Stream = Vec<u8>;
    type Song = MockSong;

    fn fs(&self) -> &MemFs {
        &self.fs
    }

    fn fs_mut(&mut self) -> &mut MemFs {
        &mut self.fs
    }

    fn init(&mut self) -> i32 {
        self.init_calls += 1;
        if !self.fs.exists(CONFIG_PATH) {
            return 1;
        }
        self.init_status
    }

    fn alloc_options(&mut self, options: DecodeOptions) -> DecodeOptions {
        self.live_options += 1;
        options
    }

    fn free_options(&mut self, _options: DecodeOptions) {
        self.live_options -= 1;
    }

    fn open_stream(&mut self, data: &[u8]) -> Vec<u8> {
        self.live_streams += 1;
        data.to_vec()
    }

    fn close_stream(&mut self, _stream: Vec<u8>) {
        self.live_streams -= 1;
    }

    fn load_song(&mut self, _stream: &mut Vec<u8>, options: &DecodeOptions) -> Option<MockSong> {
        self.load_attempts += 1;
        if self.reject {
            return None;
        }

        self.live_songs += 1;
        let missing = self
            .required
            .iter()
            .filter(|name| !self.fs.exists(&format!("/{name}")))
            .cloned()
            .collect();
        Some(MockSong {
            missing,
            format: options.format,
            channels: options.channels,
            sample_rate: options.sample_rate,
            position: 0,
            started: false,
        })
    }

    fn load_request_count(&self, song: &MockSong) -> usize {
        song.missing.len()
    }

    fn load_request(&self, song: &MockSong, index: usize) -> Option<String> {
        song.missing.get(index).cloned()
    }

    fn start_song(&mut self, song: &mut MockSong) {
        song.started = true;
    }

    fn song_time(&self, song: &MockSong) -> u32 {
        (song.position * 1000 / song.sample_rate as usize) as u32
    }

    fn song_total_time(&self, song: &MockSong) -> u32 {
        (self.total_frames * 1000 / song.sample_rate as usize) as u32
    }

    /// Frame `f`, channel `c` carries the value `f * 2 + c`.
    fn read_wave(&mut self, song: &mut MockSong, buffer: &mut [u8]) -> usize {
        if !song.started {
            return 0;
        }

        let width = song.format.bytes_per_channel();
        let frame_bytes = width * usize::from(song.channels);
        let frames = (buffer.len() / frame_bytes).min(self.total_frames - song.position);

        for (i, frame) in buffer.chunks_exact_mut(frame_bytes).take(frames).enumerate() {
            let index = song.position + i;
            for (ch, sample) in frame.chunks_exact_mut(width).enumerate() {
                Self::encode(song.format, (index * 2 + ch) as u16, sample);
            }
        }
        song.position += frames;
        frames * frame_bytes
    }

    fn free_song(&mut self, _song: MockSong) {
        self.live_songs -= 1;
        self.freed_songs += 1;
    }
}
