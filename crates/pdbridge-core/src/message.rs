//! Message types exchanged with a running patch
//!
//! Outgoing sends and incoming deliveries share the same [`Payload`] shape,
//! so a message a patch emits can be forwarded to the delegate unchanged.

use std::fmt;

/// A single list/message element
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Float(f64),
    Symbol(String),
}

impl From<f64> for Atom {
    fn from(value: f64) -> Self {
        Atom::Float(value)
    }
}

impl From<f32> for Atom {
    fn from(value: f32) -> Self {
        Atom::Float(value as f64)
    }
}

impl From<i32> for Atom {
    fn from(value: i32) -> Self {
        Atom::Float(value as f64)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Symbol(value.to_string())
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom::Symbol(value)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(v) => write!(f, "{}", v),
            Atom::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// Message body, independent of the receiver it is addressed to
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Bang,
    Float(f32),
    Symbol(String),
    List(Vec<Atom>),
    /// Typed message: `selector arg1 arg2 ...`
    Message { selector: String, args: Vec<Atom> },
}

impl Payload {
    /// Short name of the message shape, used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Bang => "bang",
            Payload::Float(_) => "float",
            Payload::Symbol(_) => "symbol",
            Payload::List(_) => "list",
            Payload::Message { .. } => "message",
        }
    }
}

/// A message a patch sent to a subscribed receiver name
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    /// Receiver name the patch addressed (`[s name]`)
    pub receiver: String,
    pub payload: Payload,
}

impl ReceivedMessage {
    pub fn new(receiver: impl Into<String>, payload: Payload) -> Self {
        Self {
            receiver: receiver.into(),
            payload,
        }
    }
}

/// MIDI traffic to or from a patch (`[notein]`, `[noteout]`, ...)
///
/// Channels are zero-based as libpd expects; values are not range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: i32, pitch: i32, velocity: i32 },
    ControlChange { channel: i32, controller: i32, value: i32 },
    ProgramChange { channel: i32, value: i32 },
    PitchBend { channel: i32, value: i32 },
    Aftertouch { channel: i32, value: i32 },
    PolyAftertouch { channel: i32, pitch: i32, value: i32 },
    MidiByte { port: i32, byte: i32 },
}

impl MidiEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MidiEvent::NoteOn { .. } => "note on",
            MidiEvent::ControlChange { .. } => "control change",
            MidiEvent::ProgramChange { .. } => "program change",
            MidiEvent::PitchBend { .. } => "pitch bend",
            MidiEvent::Aftertouch { .. } => "aftertouch",
            MidiEvent::PolyAftertouch { .. } => "poly aftertouch",
            MidiEvent::MidiByte { .. } => "midi byte",
        }
    }
}

/// Everything an engine can hand back to the control thread
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Message(ReceivedMessage),
    Midi(MidiEvent),
}

/// Build an instance-scoped receiver name (`[r $0-name]` in the patch)
pub fn scoped_receiver(dollar_zero: i32, name: &str) -> String {
    format!("{}-{}", dollar_zero, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_conversions() {
        assert_eq!(Atom::from(2), Atom::Float(2.0));
        assert_eq!(Atom::from(0.5f32), Atom::Float(0.5));
        assert_eq!(Atom::from("doit"), Atom::Symbol("doit".to_string()));
        assert_eq!(Atom::Symbol("x".into()).to_string(), "x");
    }

    #[test]
    fn test_payload_kind() {
        assert_eq!(Payload::Bang.kind(), "bang");
        let msg = Payload::Message {
            selector: "set".to_string(),
            args: vec![Atom::from(1)],
        };
        assert_eq!(msg.kind(), "message");
    }

    #[test]
    fn test_scoped_receiver() {
        assert_eq!(scoped_receiver(1003, "freq"), "1003-freq");
    }
}
