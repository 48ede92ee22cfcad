//! LibPdEngine - libpd-rs backend with a CPAL output stream
//!
//! libpd can only be initialized once per process, so there is at most one
//! live `LibPdEngine`. Several patches can be open in it at once; each is
//! isolated from the others by its `$0`.
//!
//! libpd runs in queued mode: receive hooks fire on the control thread when
//! [`AudioEngine::drain`] polls the queue, never on the audio thread.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use crossbeam::channel::{self, Receiver, Sender};
use libpd_rs::functions::receive::{
    on_bang, on_float, on_list, on_message, on_midi_after_touch, on_midi_byte,
    on_midi_control_change, on_midi_note_on, on_midi_pitch_bend, on_midi_poly_after_touch,
    on_midi_program_change, on_print, on_symbol, receive_messages_from_pd,
    receive_midi_messages_from_pd, start_listening_from, stop_listening_from,
};
use libpd_rs::functions::send::{
    send_after_touch, send_bang_to, send_control_change, send_float_to, send_list_to,
    send_message_to, send_midi_byte, send_note_on, send_pitch_bend, send_poly_after_touch,
    send_program_change, send_symbol_to,
};
use libpd_rs::functions::{close_patch, get_dollar_zero, open_patch, verbose_print_state};
use libpd_rs::types::{PatchFileHandle, ReceiverHandle};
use libpd_rs::{Atom as PdAtom, Pd};

use super::{AudioEngine, PatchHandle, PatchId};
use crate::audio::{AudioOutput, BlockRenderer};
use crate::config::EngineConfig;
use crate::error::{PdError, PdResult};
use crate::message::{Atom, EngineEvent, MidiEvent, Payload, ReceivedMessage};

/// Global flag to ensure print hook is only registered once
static PRINT_HOOK_INIT: Once = Once::new();

/// Set while a `LibPdEngine` exists in this process
static ENGINE_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Exclusive claim on the process-wide libpd instance, released on drop
struct EngineClaim;

impl EngineClaim {
    fn acquire() -> PdResult<Self> {
        if ENGINE_CLAIMED.swap(true, Ordering::AcqRel) {
            return Err(PdError::InitializationFailed(
                "a libpd engine is already running in this process".to_string(),
            ));
        }
        Ok(Self)
    }
}

impl Drop for EngineClaim {
    fn drop(&mut self) {
        ENGINE_CLAIMED.store(false, Ordering::Release);
    }
}

/// Route Pd console output to the log (registered once across the process)
fn init_print_hook(verbose: bool) {
    PRINT_HOOK_INIT.call_once(|| {
        verbose_print_state(verbose);

        on_print(|msg: &str| {
            let msg = msg.trim();
            if msg.is_empty() {
                return;
            }

            if msg.contains("error") || msg.contains("can't") || msg.contains("couldn't") {
                log::error!("[PD] {}", msg);
            } else if msg.contains("warning") || msg.contains("deprecated") {
                log::warn!("[PD] {}", msg);
            } else {
                log::info!("[PD] {}", msg);
            }
        });

        log::debug!("PD print hook initialized");
    });
}

fn from_pd_atoms(atoms: &[PdAtom]) -> Vec<Atom> {
    atoms
        .iter()
        .map(|a| match a {
            PdAtom::Float(v) => Atom::Float(*v),
            PdAtom::Symbol(s) => Atom::Symbol(s.clone()),
        })
        .collect()
}

fn to_pd_atoms(atoms: &[Atom]) -> Vec<PdAtom> {
    atoms
        .iter()
        .map(|a| match a {
            Atom::Float(v) => PdAtom::Float(*v),
            Atom::Symbol(s) => PdAtom::Symbol(s.clone()),
        })
        .collect()
}

/// Install message and MIDI hooks feeding `tx`
///
/// Hooks are process-global in libpd; re-installing replaces the previous set.
fn install_receive_hooks(tx: &Sender<EngineEvent>) {
    let message = |tx: &Sender<EngineEvent>, receiver: &str, payload: Payload| {
        let _ = tx.send(EngineEvent::Message(ReceivedMessage::new(receiver, payload)));
    };

    let t = tx.clone();
    on_bang(move |source: &str| message(&t, source, Payload::Bang));
    let t = tx.clone();
    on_float(move |source: &str, value: f32| message(&t, source, Payload::Float(value)));
    let t = tx.clone();
    on_symbol(move |source: &str, symbol: &str| {
        message(&t, source, Payload::Symbol(symbol.to_string()))
    });
    let t = tx.clone();
    on_list(move |source: &str, list: &[PdAtom]| {
        message(&t, source, Payload::List(from_pd_atoms(list)))
    });
    let t = tx.clone();
    on_message(move |source: &str, selector: &str, args: &[PdAtom]| {
        message(
            &t,
            source,
            Payload::Message {
                selector: selector.to_string(),
                args: from_pd_atoms(args),
            },
        )
    });

    let midi = |tx: &Sender<EngineEvent>, event: MidiEvent| {
        let _ = tx.send(EngineEvent::Midi(event));
    };

    let t = tx.clone();
    on_midi_note_on(move |channel: i32, pitch: i32, velocity: i32| {
        midi(&t, MidiEvent::NoteOn { channel, pitch, velocity })
    });
    let t = tx.clone();
    on_midi_control_change(move |channel: i32, controller: i32, value: i32| {
        midi(&t, MidiEvent::ControlChange { channel, controller, value })
    });
    let t = tx.clone();
    on_midi_program_change(move |channel: i32, value: i32| {
        midi(&t, MidiEvent::ProgramChange { channel, value })
    });
    let t = tx.clone();
    on_midi_pitch_bend(move |channel: i32, value: i32| {
        midi(&t, MidiEvent::PitchBend { channel, value })
    });
    let t = tx.clone();
    on_midi_after_touch(move |channel: i32, value: i32| {
        midi(&t, MidiEvent::Aftertouch { channel, value })
    });
    let t = tx.clone();
    on_midi_poly_after_touch(move |channel: i32, pitch: i32, value: i32| {
        midi(&t, MidiEvent::PolyAftertouch { channel, pitch, value })
    });
    let t = tx.clone();
    on_midi_byte(move |port: i32, byte: i32| midi(&t, MidiEvent::MidiByte { port, byte }));
}

/// libpd engine with its own output stream
pub struct LibPdEngine {
    /// The underlying libpd-rs Pd instance
    pd: Pd,

    /// Output stream, opened on first activation
    output: Option<AudioOutput>,

    /// Settings fixed at construction
    config: EngineConfig,

    /// Open patches by id
    patches: HashMap<PatchId, PatchFileHandle>,

    /// libpd bindings for subscribed receiver names
    receivers: HashMap<String, ReceiverHandle>,

    /// Events pushed by the receive hooks
    events: Receiver<EngineEvent>,

    next_patch_id: u64,

    /// Whether DSP is running
    audio_active: bool,

    shut_down: bool,

    /// Dropped last so the next engine can only start once this one is gone
    _claim: EngineClaim,
}

impl LibPdEngine {
    /// Initialize libpd with the configured channel layout and sample rate
    pub fn new(config: &EngineConfig) -> PdResult<Self> {
        config.validate()?;
        let claim = EngineClaim::acquire()?;

        // Print hook before any PD operations
        init_print_hook(config.verbose);

        let pd = Pd::init_and_configure(
            config.input_channels,
            config.output_channels,
            config.sample_rate,
        )
        .map_err(|e| PdError::InitializationFailed(format!("libpd init failed: {}", e)))?;

        let (tx, rx) = channel::unbounded();
        install_receive_hooks(&tx);

        log::info!(
            "LibPdEngine created: {} in / {} out @ {}Hz (mix with others: {})",
            config.input_channels,
            config.output_channels,
            config.sample_rate,
            config.mix_with_others
        );

        Ok(Self {
            pd,
            output: None,
            config: config.clone(),
            patches: HashMap::new(),
            receivers: HashMap::new(),
            events: rx,
            next_patch_id: 0,
            audio_active: false,
            shut_down: false,
            _claim: claim,
        })
    }

    /// Open the output stream, rendering libpd ticks on the device thread
    fn open_output(&self) -> PdResult<AudioOutput> {
        let ctx = self.pd.audio_context();
        let ticks = self.config.ticks_per_buffer;
        let mut renderer = BlockRenderer::new(
            self.config.input_channels as usize,
            self.config.output_channels as usize,
            ticks,
        );

        let output = AudioOutput::open(
            &self.config.output,
            self.config.sample_rate as u32,
            move |data, channels| {
                renderer.fill(data, channels, |input, output| {
                    ctx.process_float(ticks as i32, input, output);
                });
            },
        )?;

        Ok(output)
    }

    /// Play or pause the output stream, opening it on first activation
    fn sync_output(&mut self, active: bool) -> PdResult<()> {
        if active && self.output.is_none() {
            self.output = Some(self.open_output()?);
        }
        if let Some(output) = self.output.as_mut() {
            if active {
                output.play()?;
            } else {
                output.pause()?;
            }
        }
        Ok(())
    }

    fn send_failed(kind: &str, receiver: &str, e: &dyn std::fmt::Display) -> PdError {
        PdError::SendFailed {
            msg_type: kind.to_string(),
            receiver: receiver.to_string(),
            reason: format!("{}", e),
        }
    }

    pub fn open_patch_count(&self) -> usize {
        self.patches.len()
    }
}

impl AudioEngine for LibPdEngine {
    fn add_search_path(&mut self, path: &Path) -> PdResult<()> {
        self.pd.set_as_current();
        self.pd.add_path_to_search_paths(path).map_err(|e| {
            PdError::InitializationFailed(format!("Failed to add search path: {}", e))
        })?;

        log::debug!("Added PD search path: {}", path.display());
        Ok(())
    }

    fn open_patch(&mut self, path: &Path) -> PdResult<PatchHandle> {
        if !path.exists() {
            return Err(PdError::PatchNotFound(path.to_path_buf()));
        }

        self.pd.set_as_current();
        let file = open_patch(path).map_err(|e| PdError::PatchOpenFailed {
            path: path.to_path_buf(),
            reason: format!("{}", e),
        })?;

        let dollar_zero = match get_dollar_zero(&file) {
            Ok(d) => d,
            Err(e) => {
                let _ = close_patch(file);
                return Err(PdError::PatchOpenFailed {
                    path: path.to_path_buf(),
                    reason: format!("Failed to get $0: {}", e),
                });
            }
        };

        self.next_patch_id += 1;
        let id = PatchId(self.next_patch_id);
        self.patches.insert(id, file);

        log::info!(
            "Opened PD patch {}: {} ($0={})",
            id,
            path.display(),
            dollar_zero
        );

        Ok(PatchHandle { id, dollar_zero })
    }

    fn close_patch(&mut self, handle: PatchHandle) -> PdResult<()> {
        let file = self
            .patches
            .remove(&handle.id)
            .ok_or_else(|| PdError::PatchCloseFailed {
                name: handle.id.to_string(),
                reason: "unknown patch handle".to_string(),
            })?;

        self.pd.set_as_current();
        close_patch(file).map_err(|e| PdError::PatchCloseFailed {
            name: handle.id.to_string(),
            reason: format!("{}", e),
        })?;

        log::debug!("Closed PD patch {}", handle.id);
        Ok(())
    }

    fn set_active(&mut self, active: bool) -> PdResult<()> {
        if self.shut_down {
            return Err(PdError::Invalidated);
        }

        self.pd.set_as_current();
        self.pd
            .activate_audio(active)
            .map_err(|e| PdError::ActivationFailed {
                active,
                reason: format!("{}", e),
            })?;

        if let Err(e) = self.sync_output(active) {
            if active {
                // DSP must not keep running without a stream behind it
                if let Err(off) = self.pd.activate_audio(false) {
                    log::warn!("Failed to stop PD audio after stream error: {}", off);
                }
            }
            return Err(e);
        }

        self.audio_active = active;
        log::info!("PD audio {}", if active { "started" } else { "stopped" });
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.audio_active
    }

    fn send(&mut self, receiver: &str, payload: &Payload) -> PdResult<()> {
        // Set this instance as current before sending
        self.pd.set_as_current();

        let failed = |e: &dyn std::fmt::Display| Self::send_failed(payload.kind(), receiver, e);
        match payload {
            Payload::Bang => send_bang_to(receiver).map_err(|e| failed(&e)),
            Payload::Float(value) => send_float_to(receiver, *value).map_err(|e| failed(&e)),
            Payload::Symbol(symbol) => send_symbol_to(receiver, symbol).map_err(|e| failed(&e)),
            Payload::List(list) => {
                send_list_to(receiver, &to_pd_atoms(list)).map_err(|e| failed(&e))
            }
            Payload::Message { selector, args } => {
                send_message_to(receiver, selector, &to_pd_atoms(args)).map_err(|e| failed(&e))
            }
        }
    }

    fn send_midi(&mut self, event: &MidiEvent) -> PdResult<()> {
        self.pd.set_as_current();

        match *event {
            MidiEvent::NoteOn { channel, pitch, velocity } => send_note_on(channel, pitch, velocity),
            MidiEvent::ControlChange { channel, controller, value } => {
                send_control_change(channel, controller, value)
            }
            MidiEvent::ProgramChange { channel, value } => send_program_change(channel, value),
            MidiEvent::PitchBend { channel, value } => send_pitch_bend(channel, value),
            MidiEvent::Aftertouch { channel, value } => send_after_touch(channel, value),
            MidiEvent::PolyAftertouch { channel, pitch, value } => {
                send_poly_after_touch(channel, pitch, value)
            }
            MidiEvent::MidiByte { port, byte } => send_midi_byte(port, byte),
        }
        .map_err(|e| Self::send_failed(event.kind(), "midi", &e))
    }

    fn subscribe(&mut self, receiver: &str) -> PdResult<()> {
        if self.receivers.contains_key(receiver) {
            return Ok(());
        }

        self.pd.set_as_current();
        let handle = start_listening_from(receiver).map_err(|e| PdError::SubscribeFailed {
            receiver: receiver.to_string(),
            reason: format!("{}", e),
        })?;
        self.receivers.insert(receiver.to_string(), handle);

        log::debug!("Listening to PD receiver '{}'", receiver);
        Ok(())
    }

    fn unsubscribe(&mut self, receiver: &str) -> PdResult<()> {
        if let Some(handle) = self.receivers.remove(receiver) {
            self.pd.set_as_current();
            stop_listening_from(handle);
            log::debug!("Stopped listening to PD receiver '{}'", receiver);
        }
        Ok(())
    }

    fn drain(&mut self, sink: &mut dyn FnMut(EngineEvent)) {
        self.pd.set_as_current();
        receive_messages_from_pd();
        receive_midi_messages_from_pd();

        while let Ok(event) = self.events.try_recv() {
            sink(event);
        }
    }

    fn sample_rate(&self) -> i32 {
        self.config.sample_rate
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }

        self.pd.set_as_current();
        for (_, handle) in self.receivers.drain() {
            stop_listening_from(handle);
        }
        for (id, file) in self.patches.drain() {
            if let Err(e) = close_patch(file) {
                log::warn!("Failed to close PD patch {} on shutdown: {}", id, e);
            }
        }
        if self.audio_active {
            if let Err(e) = self.pd.activate_audio(false) {
                log::warn!("Failed to stop PD audio on shutdown: {}", e);
            }
        }
        // Dropping the stream closes the device
        self.output = None;
        self.audio_active = false;
        self.shut_down = true;

        log::info!("LibPdEngine shut down");
    }
}

impl Drop for LibPdEngine {
    fn drop(&mut self) {
        self.shutdown();
        log::debug!("LibPdEngine dropped");
    }
}
