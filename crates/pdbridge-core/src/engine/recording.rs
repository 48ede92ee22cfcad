//! In-memory engine that records every call, for bridge tests

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{AudioEngine, PatchHandle, PatchId};
use crate::error::{PdError, PdResult};
use crate::message::{EngineEvent, MidiEvent, Payload};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddSearchPath(PathBuf),
    Open(PathBuf),
    Close(PatchId),
    SetActive(bool),
    Send(String, Payload),
    SendMidi(MidiEvent),
    Subscribe(String),
    Unsubscribe(String),
    Shutdown,
}

pub struct RecordingEngine {
    pub calls: Vec<Call>,
    pub open: BTreeMap<PatchId, PathBuf>,
    pub subscribed: BTreeSet<String>,
    pub active: bool,
    pub shut_down: bool,
    /// Paths whose open is refused (parse failure in a real engine)
    pub reject_open: BTreeSet<PathBuf>,
    pub fail_sends: bool,
    pub fail_close: bool,
    pub fail_activate: bool,
    pub fail_search_path: bool,
    /// Copy of `calls` that outlives the engine
    journal: Option<Arc<Mutex<Vec<Call>>>>,
    pending: VecDeque<EngineEvent>,
    next_id: u64,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            open: BTreeMap::new(),
            subscribed: BTreeSet::new(),
            active: false,
            shut_down: false,
            reject_open: BTreeSet::new(),
            fail_sends: false,
            fail_close: false,
            fail_activate: false,
            fail_search_path: false,
            journal: None,
            pending: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Engine whose calls can still be inspected after it is dropped
    pub fn with_journal() -> (Self, Arc<Mutex<Vec<Call>>>) {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Self::new();
        engine.journal = Some(journal.clone());
        (engine, journal)
    }

    fn record(&mut self, call: Call) {
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(call.clone());
        }
        self.calls.push(call);
    }

    /// Queue an event as if the patch had emitted it
    pub fn emit(&mut self, event: EngineEvent) {
        self.pending.push_back(event);
    }

    pub fn sends(&self) -> Vec<(String, Payload)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Send(r, p) => Some((r.clone(), p.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl AudioEngine for RecordingEngine {
    fn add_search_path(&mut self, path: &Path) -> PdResult<()> {
        self.record(Call::AddSearchPath(path.to_path_buf()));
        if self.fail_search_path {
            return Err(PdError::InitializationFailed(format!(
                "Failed to add search path: {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn open_patch(&mut self, path: &Path) -> PdResult<PatchHandle> {
        self.record(Call::Open(path.to_path_buf()));
        if self.reject_open.contains(path) {
            return Err(PdError::PatchOpenFailed {
                path: path.to_path_buf(),
                reason: "rejected".to_string(),
            });
        }
        self.next_id += 1;
        let id = PatchId(self.next_id);
        self.open.insert(id, path.to_path_buf());
        Ok(PatchHandle {
            id,
            // Pd hands out $0 values from 1001 upward
            dollar_zero: 1000 + (self.next_id as i32) * 2 - 1,
        })
    }

    fn close_patch(&mut self, handle: PatchHandle) -> PdResult<()> {
        self.record(Call::Close(handle.id));
        self.open.remove(&handle.id);
        if self.fail_close {
            return Err(PdError::PatchCloseFailed {
                name: handle.id.to_string(),
                reason: "rejected".to_string(),
            });
        }
        Ok(())
    }

    fn set_active(&mut self, active: bool) -> PdResult<()> {
        self.record(Call::SetActive(active));
        if self.fail_activate {
            return Err(PdError::ActivationFailed {
                active,
                reason: "rejected".to_string(),
            });
        }
        self.active = active;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn send(&mut self, receiver: &str, payload: &Payload) -> PdResult<()> {
        self.record(Call::Send(receiver.to_string(), payload.clone()));
        if self.fail_sends {
            return Err(PdError::SendFailed {
                msg_type: payload.kind().to_string(),
                receiver: receiver.to_string(),
                reason: "rejected".to_string(),
            });
        }
        Ok(())
    }

    fn send_midi(&mut self, event: &MidiEvent) -> PdResult<()> {
        self.record(Call::SendMidi(*event));
        if self.fail_sends {
            return Err(PdError::SendFailed {
                msg_type: event.kind().to_string(),
                receiver: "midi".to_string(),
                reason: "rejected".to_string(),
            });
        }
        Ok(())
    }

    fn subscribe(&mut self, receiver: &str) -> PdResult<()> {
        self.record(Call::Subscribe(receiver.to_string()));
        self.subscribed.insert(receiver.to_string());
        Ok(())
    }

    fn unsubscribe(&mut self, receiver: &str) -> PdResult<()> {
        self.record(Call::Unsubscribe(receiver.to_string()));
        self.subscribed.remove(receiver);
        Ok(())
    }

    fn drain(&mut self, sink: &mut dyn FnMut(EngineEvent)) {
        while let Some(event) = self.pending.pop_front() {
            sink(event);
        }
    }

    fn sample_rate(&self) -> i32 {
        44100
    }

    fn shutdown(&mut self) {
        self.record(Call::Shutdown);
        self.active = false;
        self.shut_down = true;
    }
}
