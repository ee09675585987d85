use super::address::SlotAddressing;
use super::bus::{BusEvent, EventBus, Topic};
use super::redraw::RedrawScheduler;
use crate::error::ParseError;
use crossbeam_channel::Receiver;
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{debug, instrument, trace, warn};

/// What a slot indicator shows. Sending and receiving are independent bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotStatus {
    pub dirty: bool,
    pub sending: bool,
    pub receiving: bool,
}

impl SlotStatus {
    pub const fn is_clean(&self) -> bool {
        !self.dirty
    }

    pub const fn is_idle(&self) -> bool {
        !self.sending && !self.receiving
    }
}

/// Direction of a device transfer, seen from the editor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Receive,
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(Self::Send),
            "receive" => Ok(Self::Receive),
            other => Err(ParseError::InvalidDirection(other.to_owned())),
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, ui_slot_id: &str, value: bool) -> bool {
    if value {
        set.insert(ui_slot_id.to_owned())
    } else {
        set.remove(ui_slot_id)
    }
}

/// Dirty and busy bookkeeping for every UI slot id.
///
/// Every change is reflected to its slot at once. Slots that are not on screen keep their
/// status in the sets and get it back on the next [`SlotSyncTracker::render_indicators`].
pub struct SlotSyncTracker<A: SlotAddressing> {
    addressing: A,
    dirty: BTreeSet<String>,
    busy_send: BTreeSet<String>,
    busy_receive: BTreeSet<String>,
    events: Option<Receiver<BusEvent>>,
    redraw: RedrawScheduler,
}

impl<A: SlotAddressing> SlotSyncTracker<A> {
    pub fn new(addressing: A) -> Self {
        Self {
            addressing,
            dirty: BTreeSet::new(),
            busy_send: BTreeSet::new(),
            busy_receive: BTreeSet::new(),
            events: None,
            redraw: RedrawScheduler::new(),
        }
    }

    pub const fn addressing(&self) -> &A {
        &self.addressing
    }

    /// Mutable access to the presentation side, e.g. to rebuild a slot list before calling
    /// [`Self::notify_structure_changed`].
    pub fn addressing_mut(&mut self) -> &mut A {
        &mut self.addressing
    }

    /// The canonical form of a slot id, so `kit:03` and ` kit:3` track the same slot.
    /// Malformed ids are kept as given.
    fn key(&self, ui_slot_id: &str) -> String {
        self.addressing
            .resolve(ui_slot_id)
            .map_or_else(|| ui_slot_id.to_owned(), |address| address.ui_slot_id())
    }

    #[instrument(skip(self))]
    pub fn set_dirty(&mut self, ui_slot_id: &str, value: bool) {
        let key = self.key(ui_slot_id);
        if toggle(&mut self.dirty, &key, value) {
            trace!("Dirty set changed.");
        }
        self.reflect(&key);
    }

    #[instrument(skip(self))]
    pub fn set_busy(&mut self, ui_slot_id: &str, direction: Direction, value: bool) {
        let key = self.key(ui_slot_id);
        let set = match direction {
            Direction::Send => &mut self.busy_send,
            Direction::Receive => &mut self.busy_receive,
        };
        if toggle(set, &key, value) {
            trace!("Busy set changed.");
        }
        self.reflect(&key);
    }

    /// Like [`Self::set_busy`] with the direction as the transfer layer names it. Anything
    /// other than `send` or `receive` changes nothing.
    pub fn set_busy_named(&mut self, ui_slot_id: &str, direction: &str, value: bool) {
        match direction.parse::<Direction>() {
            Ok(direction) => self.set_busy(ui_slot_id, direction, value),
            Err(err) => warn!("Ignoring busy update for {}. {}", ui_slot_id, err),
        }
    }

    /// Forgets every tracked slot and shows each of them as clean and idle.
    #[instrument(skip(self))]
    pub fn clear_all(&mut self) {
        let ids = self.tracked_ids();
        self.dirty.clear();
        self.busy_send.clear();
        self.busy_receive.clear();
        debug!("Cleared {} tracked slots.", ids.len());
        for id in &ids {
            self.reflect(id);
        }
    }

    /// Applies the status of every tracked slot again.
    pub fn render_indicators(&mut self) {
        let ids = self.tracked_ids();
        trace!("Rendering {} indicators.", ids.len());
        for id in &ids {
            self.reflect(id);
        }
    }

    pub fn status(&self, ui_slot_id: &str) -> SlotStatus {
        let key = self.key(ui_slot_id);
        SlotStatus {
            dirty: self.dirty.contains(&key),
            sending: self.busy_send.contains(&key),
            receiving: self.busy_receive.contains(&key),
        }
    }

    /// Ids present in any of the sets, sorted and without repeats.
    pub fn tracked_ids(&self) -> Vec<String> {
        self.dirty
            .iter()
            .chain(&self.busy_send)
            .chain(&self.busy_receive)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn is_attached(&self) -> bool {
        self.events.is_some()
    }

    /// Subscribes to `bus`. Only the first call subscribes, later ones return false.
    pub fn attach(&mut self, bus: &EventBus) -> bool {
        if self.events.is_some() {
            debug!("Tracker already attached to a bus.");
            return false;
        }
        self.events = Some(bus.subscribe());
        true
    }

    /// Handles every event delivered since the last pump, in delivery order.
    pub fn pump(&mut self) -> usize {
        let events: Vec<BusEvent> = match &self.events {
            Some(events) => events.try_iter().collect(),
            None => return 0,
        };
        for event in &events {
            self.handle_event(event);
        }
        events.len()
    }

    pub fn handle_event(&mut self, event: &BusEvent) {
        let id = event.ui_slot_id.as_str();
        match event.topic {
            Topic::SlotDirty => self.set_dirty(id, true),
            Topic::SlotClean => self.set_dirty(id, false),
            Topic::SendStart => self.set_busy(id, Direction::Send, true),
            Topic::SendEnd => self.set_busy(id, Direction::Send, false),
            Topic::ReceiveStart => self.set_busy(id, Direction::Receive, true),
            Topic::ReceiveEnd => self.set_busy(id, Direction::Receive, false),
        }
    }

    /// Slot lists were rebuilt. Schedules one re-render for the next frame and returns
    /// false when one is already scheduled.
    pub fn notify_structure_changed(&self) -> bool {
        self.redraw.request()
    }

    /// Runs the scheduled re-render, if any.
    pub fn on_frame(&mut self) -> bool {
        if self.redraw.take() {
            self.render_indicators();
            true
        } else {
            false
        }
    }

    fn reflect(&mut self, ui_slot_id: &str) {
        let status = self.status(ui_slot_id);
        let Some(address) = self.addressing.resolve(ui_slot_id) else {
            debug!("Malformed slot id {}, nothing to reflect.", ui_slot_id);
            return;
        };
        match self.addressing.target(&address) {
            Some(target) => target.apply_status(status),
            None => trace!("Slot {} is not rendered.", address),
        }
    }
}
