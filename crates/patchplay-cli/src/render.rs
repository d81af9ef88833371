//! `patchplay render`: write a song to a WAV file.

use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat as WavFormat, WavSpec, WavWriter};
use patchplay_core::SampleFormat;
use patchplay_player::Song;
use tracing::{info, warn};

use crate::cli::RenderArgs;
use crate::session::{load_song, start_player, Engine};

pub async fn run(mut args: RenderArgs) -> Result<()> {
    if let Some(format) = args.song.format.as_deref() {
        if SampleFormat::from_token(format) != SampleFormat::S16Lsb {
            warn!("WAV output is always s16; ignoring --format {format}");
        }
    }
    args.song.format = Some(SampleFormat::S16Lsb.token().to_string());

    let (player, player_events) = start_player(&args.song).await?;
    let song = load_song(&player, player_events, &args.song).await?;
    song.start()?;

    let frames = write_wav(&song, &args.output)?;
    info!("Wrote {frames} frames to {}", args.output.display());
    Ok(())
}

/// Render `song` until end-of-stream. Returns the frames written.
pub fn write_wav(song: &Song<Engine>, path: &Path) -> Result<usize> {
    let params = song.params();
    let spec = WavSpec {
        channels: params.channels,
        sample_rate: params.sample_rate,
        bits_per_sample: 16,
        sample_format: WavFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let channels = usize::from(params.channels);
    let mut block = vec![0i16; params.buffer_size * channels];
    let mut total = 0;
    loop {
        let frames = song.render(&mut block)?;
        if frames == 0 {
            break;
        }
        for sample in &block[..frames * channels] {
            writer.write_sample(*sample)?;
        }
        total += frames;
    }

    writer.finalize()?;
    Ok(total)
}
