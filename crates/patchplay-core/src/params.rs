//! Player and song configuration.

use serde::{Deserialize, Serialize};

use crate::engine::DecodeOptions;
use crate::format::SampleFormat;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_CHANNELS: u16 = 2;
pub const DEFAULT_BUFFER_SIZE: usize = 8192;
pub const DEFAULT_CONFIG_NAME: &str = "timidity.cfg";

/// Output format requested for a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SongParams {
    /// Sample encoding.
    pub format: SampleFormat,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Frames rendered per block.
    #[serde(alias = "blockSize")]
    pub buffer_size: usize,
}

impl Default for SongParams {
    fn default() -> Self {
        Self {
            format: SampleFormat::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl SongParams {
    pub fn with_format(mut self, format: SampleFormat) -> Self {
        self.format = format;
        self
    }

    pub const fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub const fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Replace zero values with the defaults.
    pub const fn normalized(mut self) -> Self {
        if self.sample_rate == 0 {
            self.sample_rate = DEFAULT_SAMPLE_RATE;
        }
        if self.channels == 0 {
            self.channels = DEFAULT_CHANNELS;
        }
        if self.buffer_size == 0 {
            self.buffer_size = DEFAULT_BUFFER_SIZE;
        }
        self
    }

    /// Bytes per rendered frame.
    pub const fn bytes_per_sample(&self) -> usize {
        self.format.bytes_per_sample(self.channels)
    }

    /// Options handed to the engine when constructing the song.
    pub const fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            sample_rate: self.sample_rate,
            format: self.format,
            channels: self.channels,
            buffer_size: self.buffer_size,
        }
    }
}

/// Where a player finds its configuration and patch files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Base location patch names and the config name are resolved against.
    pub data_path: String,
    /// Name of the configuration file under `data_path`.
    #[serde(default = "default_config_name")]
    pub config_name: String,
}

fn default_config_name() -> String {
    DEFAULT_CONFIG_NAME.to_string()
}

impl PlayerConfig {
    pub fn new(data_path: impl Into<String>) -> Self {
        Self {
            data_path: data_path.into(),
            config_name: default_config_name(),
        }
    }

    /// Data path guaranteed to end in `/`.
    pub fn base(&self) -> String {
        let mut base = self.data_path.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        base
    }

    /// Location of a resource under the data path.
    pub fn resolve(&self, name: &str) -> String {
        format!("{}{name}", self.base())
    }

    /// Location of the configuration file.
    pub fn config_location(&self) -> String {
        self.resolve(&self.config_name)
    }
}
