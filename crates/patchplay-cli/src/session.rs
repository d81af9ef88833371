//! Bringing up a player and loading one song, shared by both commands.

use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use patchplay_core::ErrorInfo;
use patchplay_fetch::{is_remote, RoutingFetcher};
use patchplay_player::{Player, Song};
use patchplay_synth::SoundFontEngine;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::SongArgs;

pub type Engine = SoundFontEngine;

pub enum Progress {
    Ready,
    Failed(ErrorInfo),
}

fn describe(info: &ErrorInfo) -> String {
    serde_json::to_string(info).unwrap_or_else(|_| format!("{info:?}"))
}


async fn wait(events: &mut mpsc::UnboundedReceiver<Progress>, what: &str) -> Result<()> {
    match events.recv().await {
        Some(Progress::Ready) => Ok(()),
        Some(Progress::Failed(info)) => bail!("{what} failed: {}", describe(&info)),
        None => Err(anyhow!("{what} stopped without a result")),
    }
}

/// Initialise a player and wait for it to become ready.
pub async fn start_player(args: &SongArgs) -> Result<(Player<Engine>, mpsc::UnboundedReceiver<Progress>)> {
    let config = match &args.config {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config {}", path.display()))?,
        ),
        None => None,
    };

    // Song and patches may come from different places, so route each transfer.
    let player = Player::new(
        SoundFontEngine::new(),
        Rc::new(RoutingFetcher::new()?),
        args.player_config(),
    );

    let (tx, mut events) = mpsc::unbounded_channel();
    {
        let tx = tx.clone();
        player.on_ready(move || {
            let _ = tx.send(Progress::Ready);
        });
    }
    player.on_error(move |info| {
        let _ = tx.send(Progress::Failed(info.clone()));
    });

    player.initialize(config);
    wait(&mut events, "Player initialisation").await?;
    info!("Player ready");
    Ok((player, events))
}

/// Load the song named by `args` and wait until it can render.
///
/// Player-level failures such as patch downloads arrive on `player_events`.
pub async fn load_song(
    player: &Player<Engine>,
    mut player_events: mpsc::UnboundedReceiver<Progress>,
    args: &SongArgs,
) -> Result<Song<Engine>> {
    let params = args.song_params()?;
    let song = player
        .create_song(params)
        .ok_or_else(|| anyhow!("Player is not ready"))?;

    let (tx, mut events) = mpsc::unbounded_channel();
    {
        let tx = tx.clone();
        song.on_ready(move || {
            let _ = tx.send(Progress::Ready);
        });
    }
    song.on_error(move |info| {
        let _ = tx.send(Progress::Failed(info.clone()));
    });

    if is_remote(&args.song) {
        song.load_from_url(&args.song);
    } else {
        let data = tokio::fs::read(&args.song)
            .await
            .with_context(|| format!("Failed to read song {}", args.song))?;
        song.load_from_buffer(data);
    }

    tokio::select! {
        result = wait(&mut events, "Song load") => result?,
        Some(Progress::Failed(info)) = player_events.recv() => {
            bail!("Song load failed: {}", describe(&info));
        }
    }

    if let Some(total) = song.total_time() {
        info!("Song ready, {total:.1}s");
    }
    Ok(song)
}
