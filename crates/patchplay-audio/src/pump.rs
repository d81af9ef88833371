//! Moves rendered blocks from a playback node into the output ring.

use std::time::Duration;

use patchplay_core::{Result, SynthEngine};
use patchplay_player::PlaybackNode;
use tracing::{debug, info};

use crate::output::AudioOutput;
use crate::ring::SharedSampleRing;

/// Something that renders planar blocks on demand.
pub trait BlockSource {
    fn channels(&self) -> usize;
    /// Frames per block.
    fn block_size(&self) -> usize;
    /// Fill one slice per channel, returning the frames produced.
    fn process(&mut self, outputs: &mut [&mut [f32]]) -> usize;
    /// False once the source will produce nothing more.
    fn is_connected(&self) -> bool;
}

impl<E: SynthEngine + 'static> BlockSource for PlaybackNode<E> {
    fn channels(&self) -> usize {
        Self::channels(self)
    }

    fn block_size(&self) -> usize {
        Self::block_size(self)
    }

    fn process(&mut self, outputs: &mut [&mut [f32]]) -> usize {
        Self::process(self, outputs)
    }

    fn is_connected(&self) -> bool {
        Self::is_connected(self)
    }
}

pub struct Pump<S> {
    source: S,
    ring: SharedSampleRing,
    planes: Vec<Vec<f32>>,
    interleaved: Vec<f32>,
}

impl<S: BlockSource> Pump<S> {
    pub fn new(source: S, ring: SharedSampleRing) -> Self {
        let channels = source.channels();
        let block = source.block_size();
        Self {
            planes: vec![vec![0.0; block]; channels],
            interleaved: vec![0.0; block * channels],
            source,
            ring,
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Render blocks while the ring has room for a whole one.
    ///
    /// Returns the frames written. Stops early when the source produces
    /// nothing, so a source that is still loading does not spin.
    pub fn fill(&mut self) -> usize {
        let channels = self.planes.len();
        let mut total = 0;

        while self.source.is_connected() && self.ring.free() >= self.interleaved.len() {
            let frames = {
                let mut outputs: Vec<&mut [f32]> =
                    self.planes.iter_mut().map(Vec::as_mut_slice).collect();
                self.source.process(&mut outputs)
            };
            if frames == 0 {
                break;
            }

            for (frame, slot) in self.interleaved.chunks_exact_mut(channels).take(frames).enumerate() {
                for (ch, sample) in slot.iter_mut().enumerate() {
                    *sample = self.planes[ch][frame];
                }
            }
            self.ring.write(&self.interleaved[..frames * channels]);
            total += frames;
        }
        total
    }

    /// True once the source has ended and the device has played everything.
    pub fn is_drained(&self) -> bool {
        !self.source.is_connected() && self.ring.is_empty()
    }

    /// Keep `output` fed until the source is drained, then close it.
    pub async fn run(mut self, output: AudioOutput, poll: Duration) -> Result<()> {
        let mut interval = tokio::time::interval(poll);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let frames = self.fill();
            if frames > 0 {
                debug!("Queued {frames} frames");
            }

            if let Some(e) = output.take_error() {
                return Err(e);
            }
            if self.is_drained() {
                info!("Playback finished on {}", output.device_name());
                break;
            }
        }
        drop(output);
        Ok(())
    }
}
