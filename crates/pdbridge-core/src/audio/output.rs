//! CPAL output stream driving the engine
//!
//! ```text
//! ┌──────────────────┐   send / poll    ┌─────────────────────┐
//! │  Control thread  │─────────────────►│       libpd         │
//! │  (PatchBridge)   │                  │  (message queue)    │
//! └──────────────────┘                  └──────────┬──────────┘
//!                                                  │ process_float
//!                                       ┌──────────▼──────────┐
//!                                       │  CPAL Audio Thread  │
//!                                       │   (BlockRenderer)   │
//!                                       └─────────────────────┘
//! ```
//!
//! The stream is created paused-or-playing by the engine and kept for the
//! engine's lifetime; activation only plays or pauses it.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::config::OutputConfig;
use super::device::{default_output_device, find_device_by_id};
use super::error::{AudioError, AudioResult};

/// Handle to a running output stream. Drop it to close the stream.
pub struct AudioOutput {
    stream: Stream,
    sample_rate: u32,
    channels: u16,
    playing: bool,
}

impl AudioOutput {
    /// Open the configured device at `sample_rate` without starting playback
    ///
    /// `render(data, channels)` fills one interleaved device buffer and runs
    /// on the device's real-time thread.
    pub fn open<F>(config: &OutputConfig, sample_rate: u32, mut render: F) -> AudioResult<Self>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let device = match &config.device {
            Some(id) => find_device_by_id(id)?,
            None => default_output_device()?,
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using audio device: {}", device_name);

        let supported = device
            .supported_output_configs()
            .map_err(|e| AudioError::ConfigError(e.to_string()))?
            .filter(|c| c.sample_format() == SampleFormat::F32)
            .filter(|c| sample_rate >= c.min_sample_rate().0 && sample_rate <= c.max_sample_rate().0)
            .max_by_key(|c| c.channels().min(2))
            .ok_or(AudioError::UnsupportedSampleRate {
                requested: sample_rate,
            })?
            .with_sample_rate(cpal::SampleRate(sample_rate));

        let buffer_size = match config.buffer_size.as_frames() {
            Some(frames) => CpalBufferSize::Fixed(frames),
            None => CpalBufferSize::Default,
        };

        let stream_config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size,
        };
        let channels = stream_config.channels;

        log::info!(
            "Audio config: {} channels, {}Hz, ~{:.1}ms buffer",
            channels,
            sample_rate,
            config.buffer_size.latency_ms(sample_rate)
        );

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    render(data, channels as usize);
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

        // Some hosts start streams on creation
        stream
            .pause()
            .map_err(|e| AudioError::StreamPauseError(e.to_string()))?;

        Ok(Self {
            stream,
            sample_rate,
            channels,
            playing: false,
        })
    }

    pub fn play(&mut self) -> AudioResult<()> {
        if self.playing {
            return Ok(());
        }
        self.stream
            .play()
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;
        self.playing = true;
        log::debug!("Audio stream playing");
        Ok(())
    }

    pub fn pause(&mut self) -> AudioResult<()> {
        if !self.playing {
            return Ok(());
        }
        self.stream
            .pause()
            .map_err(|e| AudioError::StreamPauseError(e.to_string()))?;
        self.playing = false;
        log::debug!("Audio stream paused");
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
