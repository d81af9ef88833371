//! # patchplay-audio
//!
//! Plays a [`PlaybackNode`](patchplay_player::PlaybackNode) on the default
//! output device.
//!
//! The node lives on the player's thread and is pumped into a lock-free ring
//! buffer; the cpal callback drains the ring on the audio thread.

pub mod output;
pub mod pump;
pub mod ring;

pub use output::{AudioOutput, OutputConfig};
pub use pump::{BlockSource, Pump};
pub use ring::{shared_sample_ring, SampleRing, SharedSampleRing};
