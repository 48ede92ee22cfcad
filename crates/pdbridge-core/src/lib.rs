//! pdbridge core - embed Pure Data patches in a Rust application
//!
//! A [`PatchBridge`] loads `.pd` patches into an engine, switches DSP on
//! and off, sends floats, bangs, symbols, lists, typed messages and MIDI to
//! named receivers, and relays what the patches send back to a delegate.
//!
//! The engine sits behind the [`AudioEngine`] trait. With the
//! `libpd-engine` feature, [`LibPdEngine`] provides libpd with a CPAL
//! output stream.

pub mod audio;
pub mod bridge;
pub mod config;
pub mod delegate;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod message;
pub mod patch;

pub use bridge::{BridgeState, PatchBridge};
pub use config::EngineConfig;
pub use delegate::{ChannelDelegate, PdDelegate};
pub use dispatcher::Dispatcher;
pub use engine::{AudioEngine, PatchHandle, PatchId};
pub use error::{PdError, PdResult};
pub use message::{scoped_receiver, Atom, EngineEvent, MidiEvent, Payload, ReceivedMessage};
pub use patch::LoadedPatch;

#[cfg(feature = "libpd-engine")]
pub use bridge::LibPdBridge;
#[cfg(feature = "libpd-engine")]
pub use engine::LibPdEngine;
