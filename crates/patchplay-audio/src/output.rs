//! Device output using cpal.

use std::sync::Arc;

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig,
};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use patchplay_core::{Error, Result};
use tracing::{debug, error, info, trace};

use crate::ring::SharedSampleRing;

/// Stream shape requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// An open output stream draining a [`SharedSampleRing`].
///
/// The stream stops when this value is dropped.
pub struct AudioOutput {
    _stream: Stream,
    config: OutputConfig,
    device_name: String,
    volume: Arc<Mutex<f32>>,
    errors: Receiver<String>,
}

impl AudioOutput {
    /// Open the default output device.
    pub fn open(config: OutputConfig, ring: SharedSampleRing) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioOutput("No output device found".to_string()))?;

        Self::with_device(device, config, ring)
    }

    #[allow(clippy::needless_pass_by_value)]
    pub fn with_device(device: Device, config: OutputConfig, ring: SharedSampleRing) -> Result<Self> {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio output device: {device_name}");

        let sample_format = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get output config: {e}")))?
            .sample_format();

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: SampleRate(config.sample_rate),
            buffer_size: BufferSize::Default,
        };
        debug!(
            "Output config: {}Hz, {} channels, {sample_format:?}",
            config.sample_rate, config.channels
        );

        let volume = Arc::new(Mutex::new(1.0f32));
        let (error_tx, errors) = crossbeam_channel::unbounded();

        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &stream_config, ring, &volume, error_tx)?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &stream_config, ring, &volume, error_tx)?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &stream_config, ring, &volume, error_tx)?
            }
            _ => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {sample_format:?}"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {e}")))?;

        Ok(Self {
            _stream: stream,
            config,
            device_name,
            volume,
            errors,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &Device,
        config: &StreamConfig,
        ring: SharedSampleRing,
        volume: &Arc<Mutex<f32>>,
        errors: Sender<String>,
    ) -> Result<Stream> {
        let volume = Arc::clone(volume);
        let mut scratch: Vec<f32> = Vec::new();

        let err_fn = move |err: cpal::StreamError| {
            error!("Audio stream error: {err}");
            // The pump may already be gone.
            let _ = errors.send(err.to_string());
        };

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if scratch.len() < data.len() {
                        scratch.resize(data.len(), 0.0);
                    }
                    let read = ring.read(&mut scratch[..data.len()]);
                    let gain = *volume.lock();

                    for (i, sample) in data.iter_mut().enumerate() {
                        let value = if i < read { scratch[i] * gain } else { 0.0 };
                        *sample = T::from_sample(value);
                    }
                    if read < data.len() {
                        trace!("Underrun: needed {}, got {read}", data.len());
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {e}")))
    }

    pub const fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }

    /// Set the output gain, clamped to `0.0..=1.0`.
    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock() = volume.clamp(0.0, 1.0);
    }

    /// The first stream error reported since the last call, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.errors.try_recv().ok().map(Error::AudioOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 2);
    }
}
