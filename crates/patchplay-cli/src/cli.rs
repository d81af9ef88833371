//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use patchplay_core::{PlayerConfig, SampleFormat, SongParams};

#[derive(Parser, Debug)]
#[command(name = "patchplay")]
#[command(version, about = "Play MIDI songs, fetching instrument patches on demand")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a song on the default output device
    Play(PlayArgs),
    /// Render a song to a 16-bit WAV file
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[command(flatten)]
    pub song: SongArgs,

    /// Output volume between 0.0 and 1.0
    #[arg(long, default_value_t = 1.0)]
    pub volume: f32,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub song: SongArgs,

    /// WAV file to write
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Where the song, configuration and patches come from, and how to render.
#[derive(Args, Debug)]
pub struct SongArgs {
    /// MIDI file path or URL
    pub song: String,

    /// Directory or base URL holding the configuration and patch files
    #[arg(short, long)]
    pub data: String,

    /// Local configuration file, used instead of downloading one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the configuration file under the data path
    #[arg(long, default_value = "timidity.cfg")]
    pub config_name: String,

    /// Sample format (u8, s8, u16, s16, u16lsb, s16lsb, u16msb, s16msb)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Sample rate in Hz
    #[arg(short, long)]
    pub rate: Option<u32>,

    /// Channel count
    #[arg(long)]
    pub channels: Option<u16>,

    /// Frames per render block
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Song parameters as JSON, e.g. '{"format":"s16","sampleRate":48000}'
    #[arg(long)]
    pub params: Option<String>,
}

impl SongArgs {
    /// JSON parameters first, then individual flags on top.
    pub fn song_params(&self) -> Result<SongParams> {
        let mut params = match &self.params {
            Some(json) => serde_json::from_str(json).context("Invalid --params JSON")?,
            None => SongParams::default(),
        };

        if let Some(format) = &self.format {
            params.format = SampleFormat::from_token(format);
        }
        if let Some(rate) = self.rate {
            params.sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            params.channels = channels;
        }
        if let Some(buffer_size) = self.buffer_size {
            params.buffer_size = buffer_size;
        }
        Ok(params.normalized())
    }

    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            data_path: self.data.clone(),
            config_name: self.config_name.clone(),
        }
    }
}
