//! # patchplay
//!
//! Plays or renders a MIDI song, fetching the SoundFont and patch files it
//! needs from a data directory or URL.

mod cli;
mod play;
mod render;
mod session;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tokio::task::LocalSet;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patchplay=info,patchplay_player=debug".into()),
        )
        .init();

    info!("Starting patchplay v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    // Players are single-threaded; transfers run as local tasks.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();

    local.block_on(&runtime, async move {
        match cli.command {
            Commands::Play(args) => play::run(args).await,
            Commands::Render(args) => render::run(args).await,
        }
    })
}
