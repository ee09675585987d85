use crate::error::ParseError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::str::FromStr;
use tracing::{debug, trace};

/// Topics carrying a UI slot id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    SlotDirty,
    SlotClean,
    SendStart,
    SendEnd,
    ReceiveStart,
    ReceiveEnd,
}

impl Topic {
    pub const ALL: [Self; 6] = [
        Self::SlotDirty,
        Self::SlotClean,
        Self::SendStart,
        Self::SendEnd,
        Self::ReceiveStart,
        Self::ReceiveEnd,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SlotDirty => "slot:dirty",
            Self::SlotClean => "slot:clean",
            Self::SendStart => "transport:sendStart",
            Self::SendEnd => "transport:sendEnd",
            Self::ReceiveStart => "transport:receiveStart",
            Self::ReceiveEnd => "transport:receiveEnd",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| ParseError::InvalidTopic(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    pub topic: Topic,
    pub ui_slot_id: String,
}

impl BusEvent {
    pub fn new(topic: Topic, ui_slot_id: impl Into<String>) -> Self {
        Self {
            topic,
            ui_slot_id: ui_slot_id.into(),
        }
    }
}

/// Fan out of slot events to every subscriber, in publishing order.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<BusEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<BusEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber and returns how many got it.
    /// Subscribers whose receiver is gone are dropped.
    pub fn publish(&self, event: &BusEvent) -> usize {
        trace!("Publishing {} for {}.", event.topic, event.ui_slot_id);
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.len() != before {
            debug!("Dropped {} closed subscribers.", before - subscribers.len());
        }
        subscribers.len()
    }

    pub fn emit(&self, topic: Topic, ui_slot_id: &str) -> usize {
        self.publish(&BusEvent::new(topic, ui_slot_id))
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
