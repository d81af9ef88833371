//! # patchplay-core
//!
//! Core types, traits, and error handling shared by the patchplay crates.

pub mod engine;
pub mod error;
pub mod events;
pub mod fetch;
pub mod format;
pub mod params;

pub use engine::{DecodeOptions, SynthEngine, VirtualFs, CONFIG_PATH};
pub use error::{Error, ErrorAction, ErrorInfo, FsError, HttpError, Result};
pub use events::EventChannel;
pub use fetch::{FetchCallback, FetchResponse, Fetcher, STATUS_NETWORK_FAILURE};
pub use format::{PcmSample, SampleFormat};
pub use params::{PlayerConfig, SongParams};
