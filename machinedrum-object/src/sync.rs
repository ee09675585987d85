//! Dirty and busy status of every slot the editor shows.
//!
//! The [`SlotSyncTracker`] owns three sets of UI slot ids, fed by [`EventBus`] events.
//! Whenever a set changes the affected slot is reflected right away through the injected
//! [`SlotAddressing`]. A [`RedrawScheduler`] coalesces bulk re-renders after the slot lists
//! themselves have been rebuilt.

pub mod address;
pub mod bus;
pub mod redraw;
pub mod tracker;

pub use crate::types::SlotDomain;
pub use address::{HeadlessIndicators, PresentationTarget, SlotAddress, SlotAddressing};
pub use bus::{BusEvent, EventBus, Topic};
pub use redraw::RedrawScheduler;
pub use tracker::{Direction, SlotStatus, SlotSyncTracker};
