//! # patchplay-player
//!
//! Drives a [`SynthEngine`](patchplay_core::SynthEngine) to play MIDI songs:
//! - bootstraps the engine from a configuration file
//! - fetches the patch files each song needs, once per name
//! - retries song construction until every patch is present
//! - renders blocks of PCM and adapts them to a planar `f32` sink
//!
//! Everything here is single-threaded: state lives in `Rc`/`RefCell` and
//! progress is driven by fetch completions and render calls.

pub mod inject;
pub mod node;
pub mod player;
pub mod requests;
pub mod song;

#[cfg(test)]
mod mock;

pub use inject::inject_patch;
pub use node::PlaybackNode;
pub use player::Player;
pub use requests::{PatchRequests, PatchWaiter};
pub use song::{LoadState, Song};
