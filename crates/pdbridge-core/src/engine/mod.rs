//! The engine seam
//!
//! [`AudioEngine`] is the narrow call/callback interface the bridge drives.
//! Patch interpretation, DSP and MIDI decoding all live behind it.
//!
//! - [`LibPdEngine`] (feature `libpd-engine`): libpd via libpd-rs, audio via CPAL
//!
//! Engine-side messages are queued by the engine and handed back through
//! [`AudioEngine::drain`] on the control thread, never from the audio thread.

#[cfg(feature = "libpd-engine")]
mod libpd;
#[cfg(test)]
pub(crate) mod recording;

#[cfg(feature = "libpd-engine")]
pub use libpd::LibPdEngine;

use std::fmt;
use std::path::Path;

use crate::error::PdResult;
use crate::message::{EngineEvent, MidiEvent, Payload};

/// Engine-assigned patch identifier, unique for the engine's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub u64);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to an open patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHandle {
    pub id: PatchId,
    /// The $0 value for this patch instance
    /// Used for instance-scoped receives (e.g., $0-freq)
    pub dollar_zero: i32,
}

impl PatchHandle {
    /// Get the $0 value for instance-scoped receives
    pub fn instance_id(&self) -> i32 {
        self.dollar_zero
    }
}

/// An embeddable Pd engine
///
/// All methods are called from the single control thread that owns the
/// bridge. Implementations run their own audio thread internally.
pub trait AudioEngine {
    /// Add a directory Pd searches for abstractions and externals
    fn add_search_path(&mut self, path: &Path) -> PdResult<()>;

    /// Open a patch file, returning its handle and $0
    fn open_patch(&mut self, path: &Path) -> PdResult<PatchHandle>;

    /// Close a patch. The handle is consumed even if the engine reports failure.
    fn close_patch(&mut self, handle: PatchHandle) -> PdResult<()>;

    /// Start or stop DSP and audio output
    fn set_active(&mut self, active: bool) -> PdResult<()>;

    fn is_active(&self) -> bool;

    /// Send a message to a receiver name. Unknown receivers are not an error.
    fn send(&mut self, receiver: &str, payload: &Payload) -> PdResult<()>;

    /// Send MIDI into the patch (`[notein]`, `[ctlin]`, ...)
    fn send_midi(&mut self, event: &MidiEvent) -> PdResult<()>;

    /// Start queueing messages the patch sends to `receiver`
    fn subscribe(&mut self, receiver: &str) -> PdResult<()>;

    /// Stop queueing messages for `receiver`
    fn unsubscribe(&mut self, receiver: &str) -> PdResult<()>;

    /// Hand every queued engine event to `sink`, in arrival order
    fn drain(&mut self, sink: &mut dyn FnMut(EngineEvent));

    /// Engine sample rate in Hz
    fn sample_rate(&self) -> i32;

    /// Release audio resources. Called once when the owner is invalidated.
    fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_handle_instance_id() {
        let handle = PatchHandle {
            id: PatchId(3),
            dollar_zero: 1001,
        };
        assert_eq!(handle.instance_id(), 1001);
        assert_eq!(handle.id.to_string(), "#3");
    }
}
