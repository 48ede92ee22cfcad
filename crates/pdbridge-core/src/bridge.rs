//! PatchBridge - the control object applications hold
//!
//! Owns the engine, the loaded-patch table and the receiver registry, and
//! turns typed method calls into engine calls.
//!
//! Per-operation failures (missing patch file, engine refusing a call) are
//! logged and reduced to `bool` / `Option`; only construction returns a
//! structured error.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pdbridge_core::{ChannelDelegate, EngineConfig, PatchBridge};
//!
//! let config = EngineConfig::default().with_patch_dir("patches");
//! let mut pd = PatchBridge::with_libpd(config, "demo.pd")?;
//!
//! let (delegate, messages, _midi) = ChannelDelegate::new();
//! let delegate = Arc::new(delegate);
//! pd.set_delegate(&delegate);
//! pd.listen_to_receivers(["level"]);
//!
//! pd.send_float("freq", 440.0);
//! pd.send_bang("click");
//!
//! // On the UI tick
//! pd.poll();
//! for message in messages.try_iter() {
//!     println!("{} <- {:?}", message.receiver, message.payload);
//! }
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::delegate::PdDelegate;
use crate::dispatcher::Dispatcher;
use crate::engine::AudioEngine;
use crate::error::{PdError, PdResult};
use crate::message::{Atom, EngineEvent, MidiEvent, Payload};
use crate::patch::{resolve_patch, LoadedPatch, PatchTable};

#[cfg(feature = "libpd-engine")]
use crate::engine::LibPdEngine;

/// Lifecycle of a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Active,
    Inactive,
    /// All patches unloaded and engine resources released
    Invalidated,
}

/// Control object for an embedded Pd engine
pub struct PatchBridge<E: AudioEngine> {
    engine: E,

    /// Settings fixed at construction
    config: EngineConfig,

    /// Loaded patches in load order, plus the primary marker
    patches: PatchTable,

    /// Subscribed receivers and the delegate
    dispatcher: Dispatcher,

    /// Whether DSP is running
    active: bool,

    invalidated: bool,
}

/// Bridge over the real libpd engine
#[cfg(feature = "libpd-engine")]
pub type LibPdBridge = PatchBridge<LibPdEngine>;

#[cfg(feature = "libpd-engine")]
impl PatchBridge<LibPdEngine> {
    /// Initialize libpd and load `patch` as the primary patch
    pub fn with_libpd(config: EngineConfig, patch: &str) -> PdResult<Self> {
        let engine = LibPdEngine::new(&config)?;
        Self::new(engine, config, patch)
    }
}

impl<E: AudioEngine> PatchBridge<E> {
    /// Configure `engine`, start DSP (unless `config.start_active` is false)
    /// and load `patch` as the primary patch
    ///
    /// Fails if the patch cannot be found or opened, or the engine rejects
    /// its configuration. The engine is shut down on failure.
    pub fn new(engine: E, config: EngineConfig, patch: &str) -> PdResult<Self> {
        config.validate()?;

        let mut bridge = Self {
            engine,
            config,
            patches: PatchTable::new(),
            dispatcher: Dispatcher::new(),
            active: false,
            invalidated: false,
        };

        for path in bridge.config.search_paths.clone() {
            bridge.engine.add_search_path(&path)?;
        }

        if bridge.config.start_active {
            bridge.engine.set_active(true)?;
            bridge.active = true;
        }

        bridge.open(patch, true)?;

        log::info!(
            "PatchBridge ready: '{}' @ {}Hz ({})",
            patch,
            bridge.engine.sample_rate(),
            if bridge.active { "active" } else { "inactive" }
        );

        Ok(bridge)
    }

    fn ensure_valid(&self, operation: &str) -> bool {
        if self.invalidated {
            log::warn!("{} ignored: {}", operation, PdError::Invalidated);
            return false;
        }
        true
    }

    /// Resolve and open a patch, recording it in the table
    fn open(&mut self, name: &str, primary: bool) -> PdResult<i32> {
        if self.invalidated {
            return Err(PdError::Invalidated);
        }

        let path = resolve_patch(name, &self.config.patch_dirs)?;
        let handle = self.engine.open_patch(&path)?;
        let dollar_zero = handle.dollar_zero;

        self.patches.push(
            LoadedPatch {
                name: name.to_string(),
                path,
                handle,
            },
            primary,
        );

        log::debug!(
            "Loaded patch '{}' ($0={}, {} loaded{})",
            name,
            dollar_zero,
            self.patches.len(),
            if primary { ", primary" } else { "" }
        );

        Ok(dollar_zero)
    }

    /// Close an already-removed table entry in the engine
    fn close(&mut self, patch: LoadedPatch) -> bool {
        match self.engine.close_patch(patch.handle) {
            Ok(()) => {
                log::debug!("Unloaded patch '{}' ($0={})", patch.name, patch.dollar_zero());
                true
            }
            Err(e) => {
                log::error!("Failed to unload patch '{}': {}", patch.name, e);
                false
            }
        }
    }

    /// Load a patch and make it the primary patch
    ///
    /// Returns the patch's `$0`, or None (logged) if the file is missing or
    /// the engine refuses it. The table is unchanged on failure.
    pub fn load_patch(&mut self, name: &str) -> Option<i32> {
        match self.open(name, true) {
            Ok(dollar_zero) => Some(dollar_zero),
            Err(e) => {
                log::error!("Failed to load patch '{}': {}", name, e);
                None
            }
        }
    }

    /// Load an additional patch without changing the primary patch
    pub fn add_patch_to_patches(&mut self, name: &str) -> Option<i32> {
        match self.open(name, false) {
            Ok(dollar_zero) => Some(dollar_zero),
            Err(e) => {
                log::error!("Failed to add patch '{}': {}", name, e);
                None
            }
        }
    }

    /// Unload the primary patch
    ///
    /// Afterwards there is no primary patch. Returns false when there was
    /// nothing to unload or the engine reported a failure; the table entry
    /// is removed either way since the engine consumes the handle.
    pub fn unload_patch(&mut self) -> bool {
        let Some(id) = self.patches.primary().map(|p| p.handle.id) else {
            log::debug!("unload_patch: no primary patch loaded");
            return false;
        };

        match self.patches.remove(id) {
            Some(patch) => self.close(patch),
            None => false,
        }
    }

    /// Unload every loaded patch, in load order
    ///
    /// Always leaves the table empty. Returns how many closed cleanly.
    pub fn unload_all_patches(&mut self) -> usize {
        let all = self.patches.take_all();
        let total = all.len();
        let mut closed = 0;
        for patch in all {
            if self.close(patch) {
                closed += 1;
            }
        }

        if total > 0 {
            log::info!("Unloaded {}/{} patches", closed, total);
        }
        closed
    }

    /// Start or stop DSP
    ///
    /// Repeating the current state does not reach the engine.
    pub fn set_active(&mut self, active: bool) -> bool {
        if !self.ensure_valid("set_active") {
            return false;
        }
        if self.active == active {
            return true;
        }

        match self.engine.set_active(active) {
            Ok(()) => {
                self.active = active;
                true
            }
            Err(e) => {
                log::error!("Failed to set audio active={}: {}", active, e);
                false
            }
        }
    }

    /// Forward a message to `receiver`
    ///
    /// Receivers without a listener in the patch accept the message silently.
    pub fn send(&mut self, receiver: &str, payload: Payload) -> bool {
        if !self.ensure_valid("send") {
            return false;
        }

        match self.engine.send(receiver, &payload) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }

    pub fn send_float(&mut self, receiver: &str, value: f32) -> bool {
        self.send(receiver, Payload::Float(value))
    }

    pub fn send_bang(&mut self, receiver: &str) -> bool {
        self.send(receiver, Payload::Bang)
    }

    pub fn send_symbol(&mut self, receiver: &str, symbol: &str) -> bool {
        self.send(receiver, Payload::Symbol(symbol.to_string()))
    }

    pub fn send_list(&mut self, receiver: &str, list: Vec<Atom>) -> bool {
        self.send(receiver, Payload::List(list))
    }

    /// Send a typed message, e.g. `set 1 2` to a `[r route]`
    pub fn send_message(&mut self, receiver: &str, selector: &str, args: Vec<Atom>) -> bool {
        self.send(
            receiver,
            Payload::Message {
                selector: selector.to_string(),
                args,
            },
        )
    }

    /// Send MIDI into the patch
    pub fn send_midi(&mut self, event: MidiEvent) -> bool {
        if !self.ensure_valid("send_midi") {
            return false;
        }

        match self.engine.send_midi(&event) {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        }
    }

    pub fn send_note_on(&mut self, channel: i32, pitch: i32, velocity: i32) -> bool {
        self.send_midi(MidiEvent::NoteOn {
            channel,
            pitch,
            velocity,
        })
    }

    pub fn send_control_change(&mut self, channel: i32, controller: i32, value: i32) -> bool {
        self.send_midi(MidiEvent::ControlChange {
            channel,
            controller,
            value,
        })
    }

    pub fn send_program_change(&mut self, channel: i32, value: i32) -> bool {
        self.send_midi(MidiEvent::ProgramChange { channel, value })
    }

    pub fn send_pitch_bend(&mut self, channel: i32, value: i32) -> bool {
        self.send_midi(MidiEvent::PitchBend { channel, value })
    }

    /// `$0` of the patch at `index` in load order
    pub fn dollar_zero_for_patch(&self, index: usize) -> Option<i32> {
        let dollar_zero = self.patches.get(index).map(LoadedPatch::dollar_zero);
        if dollar_zero.is_none() {
            log::warn!(
                "dollar_zero_for_patch: index {} out of range ({} loaded)",
                index,
                self.patches.len()
            );
        }
        dollar_zero
    }

    /// Subscribe to receiver names so the patch's sends to them reach the delegate
    ///
    /// Names already subscribed are skipped. Returns how many were added.
    pub fn listen_to_receivers<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.ensure_valid("listen_to_receivers") {
            return 0;
        }

        let mut added = 0;
        for name in names {
            let name = name.as_ref();
            if self.dispatcher.contains(name) {
                continue;
            }
            match self.engine.subscribe(name) {
                Ok(()) => {
                    self.dispatcher.add(name);
                    added += 1;
                }
                Err(e) => log::error!("{}", e),
            }
        }
        added
    }

    /// Unsubscribe receiver names. Returns how many were removed.
    pub fn stop_listening<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for name in names {
            let name = name.as_ref();
            if !self.dispatcher.contains(name) {
                continue;
            }
            match self.engine.unsubscribe(name) {
                Ok(()) => {
                    self.dispatcher.remove(name);
                    removed += 1;
                }
                Err(e) => log::error!("Failed to stop listening to '{}': {}", name, e),
            }
        }
        removed
    }

    /// Set the delegate; the bridge keeps only a weak reference
    pub fn set_delegate<D>(&mut self, delegate: &Arc<D>)
    where
        D: PdDelegate + 'static,
    {
        self.dispatcher.set_delegate(delegate);
    }

    pub fn clear_delegate(&mut self) {
        self.dispatcher.clear_delegate();
    }

    /// Deliver everything the patch has sent since the last poll
    ///
    /// Messages on subscribed receivers and all MIDI go to the delegate in
    /// arrival order. Returns how many deliveries were made.
    pub fn poll(&mut self) -> usize {
        if self.invalidated {
            return 0;
        }

        let mut delivered = 0;
        let dispatcher = &self.dispatcher;
        self.engine.drain(&mut |event| {
            let hit = match event {
                EngineEvent::Message(message) => dispatcher.dispatch(&message),
                EngineEvent::Midi(midi) => dispatcher.dispatch_midi(&midi),
            };
            if hit {
                delivered += 1;
            }
        });
        delivered
    }

    /// Unload everything, stop DSP, drop subscriptions and release the engine
    ///
    /// Every later operation is a logged no-op. Called on drop.
    pub fn invalidate(&mut self) {
        if self.invalidated {
            return;
        }

        self.unload_all_patches();

        for name in self.dispatcher.clear() {
            if let Err(e) = self.engine.unsubscribe(&name) {
                log::warn!("Failed to stop listening to '{}': {}", name, e);
            }
        }
        self.dispatcher.clear_delegate();

        if self.active {
            if let Err(e) = self.engine.set_active(false) {
                log::warn!("Failed to stop audio during invalidate: {}", e);
            }
            self.active = false;
        }

        self.engine.shutdown();
        self.invalidated = true;

        log::info!("PatchBridge invalidated");
    }

    pub fn state(&self) -> BridgeState {
        if self.invalidated {
            BridgeState::Invalidated
        } else if self.active {
            BridgeState::Active
        } else {
            BridgeState::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// The patch most recently loaded with [`load_patch`](Self::load_patch)
    pub fn primary_patch(&self) -> Option<&LoadedPatch> {
        self.patches.primary()
    }

    /// All loaded patches in load order
    pub fn patches(&self) -> &[LoadedPatch] {
        self.patches.as_slice()
    }

    /// Subscribed receiver names in subscription order
    pub fn receivers(&self) -> &[String] {
        self.dispatcher.names()
    }

    pub fn is_listening_to(&self, name: &str) -> bool {
        self.dispatcher.contains(name)
    }

    pub fn sample_rate(&self) -> i32 {
        self.engine.sample_rate()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access; bypasses the bridge's bookkeeping
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: AudioEngine> Drop for PatchBridge<E> {
    fn drop(&mut self) {
        self.invalidate();
    }
}
