//! # patchplay-synth
//!
//! A [`SynthEngine`](patchplay_core::SynthEngine) backed by `rustysynth`.
//!
//! The engine reads everything from its own in-memory filesystem: the
//! configuration at `/timidity.cfg` names a SoundFont, and songs report that
//! SoundFont as missing until the player has fetched and injected it.

pub mod config;
pub mod encode;
pub mod engine;
pub mod fs;

pub use config::SynthConfig;
pub use engine::{SoundFontEngine, SoundFontSong};
pub use fs::MemFs;
