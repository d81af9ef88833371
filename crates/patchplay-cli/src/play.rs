//! `patchplay play`: stream a song to the default output device.

use std::time::Duration;

use anyhow::{anyhow, Result};
use patchplay_audio::{shared_sample_ring, AudioOutput, OutputConfig, Pump};
use tracing::info;

use crate::cli::PlayArgs;
use crate::session::{load_song, start_player};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub async fn run(args: PlayArgs) -> Result<()> {
    let (player, player_events) = start_player(&args.song).await?;
    let song = load_song(&player, player_events, &args.song).await?;

    let params = *song.params();
    let node = song
        .create_playback_node(params.sample_rate)
        .ok_or_else(|| anyhow!("Playback needs s16 output in one or two channels, got {}", params.format))?;

    // Half a second of headroom.
    let ring = shared_sample_ring(params.sample_rate as usize * usize::from(params.channels) / 2);
    let output = AudioOutput::open(
        OutputConfig {
            sample_rate: params.sample_rate,
            channels: params.channels,
        },
        ring.clone(),
    )?;
    output.set_volume(args.volume);

    song.start()?;
    info!("Playing on {}", output.device_name());
    Pump::new(node, ring).run(output, POLL_INTERVAL).await?;
    Ok(())
}
