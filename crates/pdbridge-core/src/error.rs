//! Error types for the Pure Data bridge
//!
//! Structured errors for engine initialization, patch lifecycle,
//! message sends and receiver subscriptions.

use std::path::PathBuf;
use thiserror::Error;

use crate::audio::AudioError;

/// Errors that can occur during PD operations
#[derive(Debug, Error)]
pub enum PdError {
    /// Failed to initialize the engine
    #[error("Failed to initialize libpd: {0}")]
    InitializationFailed(String),

    /// Failed to configure engine audio
    #[error("Failed to configure audio: {in_channels} in / {out_channels} out @ {sample_rate}Hz - {reason}")]
    AudioConfigFailed {
        in_channels: i32,
        out_channels: i32,
        sample_rate: i32,
        reason: String,
    },

    /// Patch file not found in any patch directory
    #[error("Patch file not found: {0}")]
    PatchNotFound(PathBuf),

    /// Engine refused to open a patch file
    #[error("Failed to open patch '{path}': {reason}")]
    PatchOpenFailed { path: PathBuf, reason: String },

    /// Engine refused to close a patch
    #[error("Failed to close patch '{name}': {reason}")]
    PatchCloseFailed { name: String, reason: String },

    /// Failed to send a message into the engine
    #[error("Failed to send {msg_type} to receiver '{receiver}': {reason}")]
    SendFailed {
        msg_type: String,
        receiver: String,
        reason: String,
    },

    /// Failed to (un)subscribe a receiver name
    #[error("Failed to subscribe to receiver '{receiver}': {reason}")]
    SubscribeFailed { receiver: String, reason: String },

    /// Failed to switch DSP on or off
    #[error("Failed to set audio active={active}: {reason}")]
    ActivationFailed { active: bool, reason: String },

    /// Bridge was invalidated; no further engine calls are made
    #[error("Bridge has been invalidated")]
    Invalidated,

    /// Audio output error
    #[error("Audio output error: {0}")]
    Audio(#[from] AudioError),

    /// YAML parsing error for configuration
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl PdError {
    /// True for the "resource not found" class of failures
    pub fn is_not_found(&self) -> bool {
        matches!(self, PdError::PatchNotFound(_))
    }
}

/// Result type for PD operations
pub type PdResult<T> = Result<T, PdError>;
