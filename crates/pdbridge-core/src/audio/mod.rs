//! Audio output for the libpd engine
//!
//! The engine renders in fixed ticks; the device asks for its own buffer
//! length. [`BlockRenderer`] bridges the two and [`AudioOutput`] owns the
//! CPAL stream that calls it.
//!
//! Device access is only compiled with the `libpd-engine` feature; the
//! configuration and block adapter are always available.

mod config;
mod error;
mod render;

#[cfg(feature = "libpd-engine")]
mod device;
#[cfg(feature = "libpd-engine")]
mod output;

pub use config::{
    BufferSize, DeviceId, OutputConfig, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE,
};
pub use error::{AudioError, AudioResult};
pub use render::{BlockRenderer, PD_BLOCK_SIZE};

#[cfg(feature = "libpd-engine")]
pub use device::{default_output_device, find_device_by_id};
#[cfg(feature = "libpd-engine")]
pub use output::AudioOutput;
