//! Dispatcher - receiver registry and delegate fan-out
//!
//! Tracks which receiver names the bridge listens to and forwards engine
//! events on those names to the delegate, unchanged and in order.

use std::sync::{Arc, Weak};

use crate::delegate::PdDelegate;
use crate::message::{MidiEvent, ReceivedMessage};

#[derive(Default)]
pub struct Dispatcher {
    /// Subscribed receiver names in subscription order
    receivers: Vec<String>,

    /// Weakly held delegate; deliveries stop once its owner drops it
    delegate: Option<Weak<dyn PdDelegate>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delegate, replacing any previous one
    pub fn set_delegate<D>(&mut self, delegate: &Arc<D>)
    where
        D: PdDelegate + 'static,
    {
        let weak = Arc::downgrade(delegate);
        self.delegate = Some(weak as Weak<dyn PdDelegate>);
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// True while a delegate is set and still alive
    pub fn has_delegate(&self) -> bool {
        self.delegate
            .as_ref()
            .map(|d| d.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Register a receiver name. Returns false if it was already registered.
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.receivers.push(name.to_string());
        true
    }

    /// Unregister a receiver name. Returns false if it was not registered.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.receivers.iter().position(|r| r == name) {
            Some(index) => {
                self.receivers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.receivers.iter().any(|r| r == name)
    }

    pub fn names(&self) -> &[String] {
        &self.receivers
    }

    /// Unregister everything, returning the names in subscription order
    pub fn clear(&mut self) -> Vec<String> {
        std::mem::take(&mut self.receivers)
    }

    fn live_delegate(&self) -> Option<Arc<dyn PdDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    /// Deliver a message if its receiver is subscribed
    ///
    /// Returns true if the delegate was called.
    pub fn dispatch(&self, message: &ReceivedMessage) -> bool {
        if !self.contains(&message.receiver) {
            log::debug!(
                "Dropping {} on unsubscribed receiver '{}'",
                message.payload.kind(),
                message.receiver
            );
            return false;
        }

        match self.live_delegate() {
            Some(delegate) => {
                delegate.receive(message);
                true
            }
            None => false,
        }
    }

    /// Deliver a MIDI event. MIDI is not filtered by receiver name.
    pub fn dispatch_midi(&self, event: &MidiEvent) -> bool {
        match self.live_delegate() {
            Some(delegate) => {
                delegate.receive_midi(event);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::ChannelDelegate;
    use crate::message::Payload;

    #[test]
    fn test_add_is_idempotent() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.add("freq"));
        assert!(!dispatcher.add("freq"));
        assert!(dispatcher.add("level"));
        assert_eq!(dispatcher.names(), &["freq".to_string(), "level".to_string()]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add("a");
        dispatcher.add("b");

        assert!(dispatcher.remove("a"));
        assert!(!dispatcher.remove("a"));
        assert_eq!(dispatcher.clear(), vec!["b".to_string()]);
        assert!(dispatcher.names().is_empty());
    }

    #[test]
    fn test_only_subscribed_names_are_delivered() {
        let (delegate, messages, _midi) = ChannelDelegate::new();
        let delegate = Arc::new(delegate);

        let mut dispatcher = Dispatcher::new();
        dispatcher.set_delegate(&delegate);
        dispatcher.add("level");

        let hit = ReceivedMessage::new("level", Payload::Float(0.25));
        let miss = ReceivedMessage::new("other", Payload::Bang);
        assert!(dispatcher.dispatch(&hit));
        assert!(!dispatcher.dispatch(&miss));

        let got: Vec<_> = messages.try_iter().collect();
        assert_eq!(got, vec![hit]);
    }

    #[test]
    fn test_dropped_delegate_is_not_called() {
        let (delegate, messages, midi) = ChannelDelegate::new();
        let delegate = Arc::new(delegate);

        let mut dispatcher = Dispatcher::new();
        dispatcher.set_delegate(&delegate);
        dispatcher.add("level");
        assert!(dispatcher.has_delegate());

        drop(delegate);
        assert!(!dispatcher.has_delegate());
        assert!(!dispatcher.dispatch(&ReceivedMessage::new("level", Payload::Bang)));
        assert!(!dispatcher.dispatch_midi(&MidiEvent::PitchBend { channel: 0, value: 0 }));
        assert_eq!(messages.try_iter().count(), 0);
        assert_eq!(midi.try_iter().count(), 0);
    }

    #[test]
    fn test_midi_delivered_without_subscription() {
        let (delegate, _messages, midi) = ChannelDelegate::new();
        let delegate = Arc::new(delegate);

        let mut dispatcher = Dispatcher::new();
        dispatcher.set_delegate(&delegate);

        let event = MidiEvent::ControlChange {
            channel: 1,
            controller: 7,
            value: 127,
        };
        assert!(dispatcher.dispatch_midi(&event));
        assert_eq!(midi.try_recv().unwrap(), event);
    }
}
