//! Audio output error types

use thiserror::Error;

/// Errors that can occur while opening or running the output stream
#[derive(Error, Debug)]
pub enum AudioError {
    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Device not found
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to get device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Failed to pause stream
    #[error("Failed to pause audio stream: {0}")]
    StreamPauseError(String),

    /// Device cannot run at the engine's sample rate
    #[error("Device does not support {requested}Hz")]
    UnsupportedSampleRate { requested: u32 },
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
