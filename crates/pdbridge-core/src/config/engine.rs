//! Engine configuration fixed at bridge construction

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::OutputConfig;
use crate::error::{PdError, PdResult};

/// Default engine sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: i32 = 44100;

/// Default engine input channels (no microphone input)
pub const DEFAULT_INPUT_CHANNELS: i32 = 0;

/// Default engine output channels (stereo)
pub const DEFAULT_OUTPUT_CHANNELS: i32 = 2;

/// Default engine ticks rendered per device refill
pub const DEFAULT_TICKS_PER_BUFFER: usize = 8;

/// Audio engine settings
///
/// Every field has a serde default, so a partial YAML file is valid:
///
/// ```yaml
/// sample_rate: 48000
/// patch_dirs: [patches]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine sample rate in Hz
    pub sample_rate: i32,

    /// Engine input channel count (`[adc~]`)
    pub input_channels: i32,

    /// Engine output channel count (`[dac~]`)
    pub output_channels: i32,

    /// Engine ticks (64 frames each) rendered per refill of the output block
    pub ticks_per_buffer: usize,

    /// Whether our audio may play alongside other applications' audio
    ///
    /// Recorded for hosts with a shared audio-session policy; desktop hosts
    /// always mix.
    pub mix_with_others: bool,

    /// Start DSP as soon as the bridge is constructed
    pub start_active: bool,

    /// Let Pd's console output through at info level
    pub verbose: bool,

    /// Directories searched, in order, when a patch is named without a path
    pub patch_dirs: Vec<PathBuf>,

    /// Extra Pd search paths for abstractions and externals
    pub search_paths: Vec<PathBuf>,

    /// Output stream settings
    pub output: OutputConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            input_channels: DEFAULT_INPUT_CHANNELS,
            output_channels: DEFAULT_OUTPUT_CHANNELS,
            ticks_per_buffer: DEFAULT_TICKS_PER_BUFFER,
            mix_with_others: true,
            start_active: true,
            verbose: true,
            patch_dirs: vec![PathBuf::from(".")],
            search_paths: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document, rejecting invalid values
    pub fn from_yaml_str(yaml: &str) -> PdResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Add a directory to search for patches by name
    pub fn with_patch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.patch_dirs.push(dir.into());
        self
    }

    /// Add a Pd search path (abstractions, externals)
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: i32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_channels(mut self, input_channels: i32, output_channels: i32) -> Self {
        self.input_channels = input_channels;
        self.output_channels = output_channels;
        self
    }

    /// Keep DSP off after construction
    pub fn inactive(mut self) -> Self {
        self.start_active = false;
        self
    }

    /// Check values the engine would reject
    pub fn validate(&self) -> PdResult<()> {
        let reason = if self.sample_rate <= 0 {
            Some("sample rate must be positive")
        } else if self.input_channels < 0 || self.output_channels < 0 {
            Some("channel counts cannot be negative")
        } else if self.ticks_per_buffer == 0 {
            Some("ticks per buffer must be at least 1")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PdError::AudioConfigFailed {
                in_channels: self.input_channels,
                out_channels: self.output_channels,
                sample_rate: self.sample_rate,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}
