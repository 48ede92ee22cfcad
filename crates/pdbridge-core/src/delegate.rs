//! Delegates receive what a patch sends back
//!
//! The bridge holds its delegate weakly: the owner keeps the `Arc` alive,
//! and once it is dropped deliveries are silently discarded.

use crossbeam::channel::{self, Receiver, Sender};

use crate::message::{MidiEvent, ReceivedMessage};

/// Observer for patch-originated messages
pub trait PdDelegate: Send + Sync {
    /// A patch sent `message` to a subscribed receiver name
    fn receive(&self, message: &ReceivedMessage);

    /// A patch emitted MIDI (`[noteout]`, `[ctlout]`, ...)
    fn receive_midi(&self, _event: &MidiEvent) {}
}

impl<F> PdDelegate for F
where
    F: Fn(&ReceivedMessage) + Send + Sync,
{
    fn receive(&self, message: &ReceivedMessage) {
        self(message)
    }
}

/// Delegate that forwards everything into channels the caller polls
///
/// ```ignore
/// let (delegate, messages, _midi) = ChannelDelegate::new();
/// let delegate = Arc::new(delegate);
/// bridge.set_delegate(&delegate);
/// bridge.poll();
/// for message in messages.try_iter() { ... }
/// ```
pub struct ChannelDelegate {
    messages: Sender<ReceivedMessage>,
    midi: Sender<MidiEvent>,
}

impl ChannelDelegate {
    pub fn new() -> (Self, Receiver<ReceivedMessage>, Receiver<MidiEvent>) {
        let (messages, message_rx) = channel::unbounded();
        let (midi, midi_rx) = channel::unbounded();
        (Self { messages, midi }, message_rx, midi_rx)
    }
}

impl PdDelegate for ChannelDelegate {
    fn receive(&self, message: &ReceivedMessage) {
        if self.messages.send(message.clone()).is_err() {
            log::debug!("Message receiver dropped, discarding '{}'", message.receiver);
        }
    }

    fn receive_midi(&self, event: &MidiEvent) {
        if self.midi.send(*event).is_err() {
            log::debug!("MIDI receiver dropped, discarding {}", event.kind());
        }
    }
}
