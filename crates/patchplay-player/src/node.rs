//! Adapter from a song's interleaved `s16` blocks to planar `f32` output.

use std::cell::Cell;
use std::rc::Rc;

use patchplay_core::{SampleFormat, SynthEngine};
use tracing::{debug, warn};

use crate::song::Song;

const SCALE: f32 = 32767.0;

/// Pulls one block from a song per callback and de-interleaves it.
///
/// The node disconnects itself when the song ends; after that every callback
/// produces silence.
pub struct PlaybackNode<E: SynthEngine> {
    song: Song<E>,
    block: Vec<i16>,
    channels: usize,
    connected: Rc<Cell<bool>>,
}

impl<E: SynthEngine + 'static> Song<E> {
    /// Build a playback node feeding a sink running at `sink_rate` Hz.
    ///
    /// Requires `s16` output in one or two channels at the sink's rate.
    pub fn create_playback_node(&self, sink_rate: u32) -> Option<PlaybackNode<E>> {
        let params = *self.params();
        if params.format != SampleFormat::S16Lsb {
            warn!("Playback node needs s16 samples, song uses {}", params.format);
            return None;
        }
        if params.sample_rate != sink_rate {
            warn!(
                "Song rate {} does not match sink rate {sink_rate}",
                params.sample_rate
            );
            return None;
        }
        if !(1..=2).contains(&params.channels) {
            warn!("Playback node supports 1 or 2 channels, not {}", params.channels);
            return None;
        }

        let connected = Rc::new(Cell::new(true));
        {
            let connected = Rc::clone(&connected);
            self.on_ended(move || {
                debug!("Song ended, disconnecting playback node");
                connected.set(false);
            });
        }

        let channels = usize::from(params.channels);
        Some(PlaybackNode {
            song: self.clone(),
            block: vec![0; params.buffer_size * channels],
            channels,
            connected,
        })
    }
}

impl<E: SynthEngine + 'static> PlaybackNode<E> {
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Frames per block.
    pub fn block_size(&self) -> usize {
        self.block.len() / self.channels
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub const fn song(&self) -> &Song<E> {
        &self.song
    }

    /// Fill `outputs`, one slice per sink channel.
    ///
    /// Returns the frames taken from the song. Whatever the song did not
    /// cover, including sink channels beyond the song's, is zeroed.
    pub fn process(&mut self, outputs: &mut [&mut [f32]]) -> usize {
        let frames = if self.connected.get() {
            match self.song.render(&mut self.block) {
                Ok(frames) => frames,
                Err(e) => {
                    warn!("Render failed: {e}");
                    0
                }
            }
        } else {
            0
        };

        for (ch, output) in outputs.iter_mut().enumerate() {
            let mut filled = 0;
            if ch < self.channels {
                let samples = self.block.chunks_exact(self.channels).take(frames);
                for (out, frame) in output.iter_mut().zip(samples) {
                    *out = f32::from(frame[ch]) / SCALE;
                    filled += 1;
                }
            }
            output[filled..].fill(0.0);
        }
        frames
    }
}
