//! The synthesis engine capability consumed by the player.
//!
//! The engine owns MIDI parsing, synthesis and patch decoding. The player
//! only feeds it files and pulls PCM out of it.

use crate::error::FsError;
use crate::format::SampleFormat;

/// Path the configuration text is written to before [`SynthEngine::init`].
pub const CONFIG_PATH: &str = "/timidity.cfg";

/// Parameters for one song construction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub channels: u16,
    /// Frames per render block.
    pub buffer_size: usize,
}

/// Addressable storage the engine reads configuration and patches from.
pub trait VirtualFs {
    /// Create a directory whose parent already exists.
    ///
    /// Fails with [`FsError::AlreadyExists`] if the path is taken.
    fn mkdir(&mut self, path: &str) -> Result<(), FsError>;

    /// Create or replace a file whose parent directory exists.
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), FsError>;

    fn read_file(&self, path: &str) -> Option<&[u8]>;

    fn exists(&self, path: &str) -> bool;
}

/// An opaque synthesis library instance.
///
/// Handles are plain values: the engine hands them out and takes them back
/// through the matching `free`/`close` call.
pub trait SynthEngine {
    type Fs: VirtualFs;
    /// Engine-side decode options allocation.
    type Options;
    /// Byte stream over song data copied into engine memory.
    type Stream;
    /// Native song handle.
    type Song;

    fn fs(&self) -> &Self::Fs;
    fn fs_mut(&mut self) -> &mut Self::Fs;

    /// One-time initialization from [`CONFIG_PATH`]. Zero means success.
    fn init(&mut self) -> i32;

    fn alloc_options(&mut self, options: DecodeOptions) -> Self::Options;
    fn free_options(&mut self, options: Self::Options);

    fn open_stream(&mut self, data: &[u8]) -> Self::Stream;
    fn close_stream(&mut self, stream: Self::Stream);

    /// Construct a song, or `None` if the data is unusable.
    fn load_song(&mut self, stream: &mut Self::Stream, options: &Self::Options)
        -> Option<Self::Song>;

    /// Number of resources the song could not find.
    fn load_request_count(&self, song: &Self::Song) -> usize;
    /// Name of the missing resource at `index`.
    fn load_request(&self, song: &Self::Song, index: usize) -> Option<String>;

    fn start_song(&mut self, song: &mut Self::Song);

    /// Playback position in milliseconds.
    fn song_time(&self, song: &Self::Song) -> u32;
    /// Song length in milliseconds.
    fn song_total_time(&self, song: &Self::Song) -> u32;

    /// Render up to `buffer.len()` bytes, returning the count written.
    fn read_wave(&mut self, song: &mut Self::Song, buffer: &mut [u8]) -> usize;

    fn free_song(&mut self, song: Self::Song);
}
