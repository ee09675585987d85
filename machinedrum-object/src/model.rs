//! Shapes and defaults of the objects the device persists, and the slot libraries holding them.

pub mod fixed_array;
pub mod global;
pub mod kit;
pub mod pattern;
pub mod song;

pub use global::Global;
pub use kit::Kit;
pub use pattern::Pattern;
pub use song::Song;

use crate::error::ModelError;
use crate::pattern_label::PATTERN_COUNT;
use crate::types::{DeviceModel, SlotDomain};
use tracing::{debug, info, instrument};

pub const TRACK_COUNT: usize = 16;
pub const PARAMS_PER_TRACK: usize = 8;

/// The device dump an object was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDump(Vec<u8>);

impl RawDump {
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn slot<T>(
    slots: &mut [Option<T>],
    domain: SlotDomain,
    index: usize,
) -> Result<&mut Option<T>, ModelError> {
    let capacity = slots.len();
    slots.get_mut(index).ok_or(ModelError::SlotOutOfRange {
        domain,
        index,
        capacity,
    })
}

/// Everything the editor knows about the connected device.
///
/// Slot libraries start out empty, the current objects start out at their defaults.
/// The transfer layer fills both in.
#[derive(Debug, Clone)]
pub struct DeviceState {
    model: DeviceModel,
    songs: Vec<Option<Song>>,
    patterns: Vec<Option<Pattern>>,
    kits: Vec<Option<Kit>>,
    globals: Vec<Option<Global>>,

    pub current_kit: Kit,
    pub current_pattern: Pattern,
    pub current_global: Global,
    pub current_song: Song,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(DeviceModel::default())
    }
}

impl DeviceState {
    pub fn new(model: DeviceModel) -> Self {
        Self {
            model,
            songs: vec![None; song::SONG_SLOT_COUNT],
            patterns: vec![None; PATTERN_COUNT],
            kits: vec![None; model.kit_capacity()],
            globals: vec![None; global::GLOBAL_SLOT_COUNT],
            current_kit: Kit::new(),
            current_pattern: Pattern::new(0),
            current_global: Global::new(0),
            current_song: Song::new(0),
        }
    }

    /// Back to the state at startup, keeping the device model.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        *self = Self::new(self.model);
        info!("Device state reset for {}.", self.model);
    }

    pub const fn model(&self) -> DeviceModel {
        self.model
    }

    /// Switches the model, growing or cutting the kit library to the new capacity.
    pub fn set_model(&mut self, model: DeviceModel) {
        if model != self.model {
            debug!("Device model changed from {} to {}.", self.model, model);
        }
        self.model = model;
        self.kits.resize(model.kit_capacity(), None);
    }

    pub fn capacity(&self, domain: SlotDomain) -> usize {
        match domain {
            SlotDomain::Global => self.globals.len(),
            SlotDomain::Song => self.songs.len(),
            SlotDomain::Kit => self.kits.len(),
            SlotDomain::Pattern => self.patterns.len(),
        }
    }

    pub fn is_occupied(&self, domain: SlotDomain, index: usize) -> bool {
        match domain {
            SlotDomain::Global => self.global(index).is_some(),
            SlotDomain::Song => self.song(index).is_some(),
            SlotDomain::Kit => self.kit(index).is_some(),
            SlotDomain::Pattern => self.pattern(index).is_some(),
        }
    }

    /// Indices of the filled slots of a library.
    pub fn occupied(&self, domain: SlotDomain) -> Vec<usize> {
        (0..self.capacity(domain))
            .filter(|index| self.is_occupied(domain, *index))
            .collect()
    }

    pub fn kit(&self, index: usize) -> Option<&Kit> {
        self.kits.get(index).and_then(Option::as_ref)
    }

    pub fn kit_mut(&mut self, index: usize) -> Option<&mut Kit> {
        self.kits.get_mut(index).and_then(Option::as_mut)
    }

    pub fn set_kit(&mut self, index: usize, kit: Kit) -> Result<Option<Kit>, ModelError> {
        Ok(slot(&mut self.kits, SlotDomain::Kit, index)?.replace(kit))
    }

    pub fn clear_kit(&mut self, index: usize) -> Result<Option<Kit>, ModelError> {
        Ok(slot(&mut self.kits, SlotDomain::Kit, index)?.take())
    }

    pub fn pattern(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index).and_then(Option::as_ref)
    }

    pub fn pattern_mut(&mut self, index: usize) -> Option<&mut Pattern> {
        self.patterns.get_mut(index).and_then(Option::as_mut)
    }

    pub fn set_pattern(&mut self, index: usize, pattern: Pattern) -> Result<Option<Pattern>, ModelError> {
        Ok(slot(&mut self.patterns, SlotDomain::Pattern, index)?.replace(pattern))
    }

    pub fn clear_pattern(&mut self, index: usize) -> Result<Option<Pattern>, ModelError> {
        Ok(slot(&mut self.patterns, SlotDomain::Pattern, index)?.take())
    }

    pub fn global(&self, index: usize) -> Option<&Global> {
        self.globals.get(index).and_then(Option::as_ref)
    }

    pub fn global_mut(&mut self, index: usize) -> Option<&mut Global> {
        self.globals.get_mut(index).and_then(Option::as_mut)
    }

    pub fn set_global(&mut self, index: usize, global: Global) -> Result<Option<Global>, ModelError> {
        Ok(slot(&mut self.globals, SlotDomain::Global, index)?.replace(global))
    }

    pub fn clear_global(&mut self, index: usize) -> Result<Option<Global>, ModelError> {
        Ok(slot(&mut self.globals, SlotDomain::Global, index)?.take())
    }

    pub fn song(&self, index: usize) -> Option<&Song> {
        self.songs.get(index).and_then(Option::as_ref)
    }

    pub fn song_mut(&mut self, index: usize) -> Option<&mut Song> {
        self.songs.get_mut(index).and_then(Option::as_mut)
    }

    pub fn set_song(&mut self, index: usize, song: Song) -> Result<Option<Song>, ModelError> {
        Ok(slot(&mut self.songs, SlotDomain::Song, index)?.replace(song))
    }

    pub fn clear_song(&mut self, index: usize) -> Result<Option<Song>, ModelError> {
        Ok(slot(&mut self.songs, SlotDomain::Song, index)?.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_capacities() {
        let state = DeviceState::new(DeviceModel::UwMk2);
        assert_eq!(state.capacity(SlotDomain::Song), 32);
        assert_eq!(state.capacity(SlotDomain::Pattern), 128);
        assert_eq!(state.capacity(SlotDomain::Kit), 64);
        assert_eq!(state.capacity(SlotDomain::Global), 8);
        for domain in SlotDomain::ALL {
            assert!(state.occupied(domain).is_empty());
        }
    }

    #[test]
    fn test_slots_fill_and_clear() {
        let mut state = DeviceState::default();
        let mut kit = Kit::new();
        kit.set_name("ROOM");
        assert_eq!(state.set_kit(5, kit), Ok(None));
        assert_eq!(state.kit(5).map(|k| k.kit_name.as_str()), Some("ROOM"));
        assert_eq!(state.occupied(SlotDomain::Kit), vec![5]);

        state.set_pattern(127, Pattern::new(127)).unwrap();
        assert!(state.is_occupied(SlotDomain::Pattern, 127));

        assert!(state.clear_kit(5).unwrap().is_some());
        assert!(state.kit(5).is_none());
    }

    #[test]
    fn test_out_of_range_slots_are_rejected() {
        let mut state = DeviceState::default();
        assert_eq!(
            state.set_global(8, Global::new(7)),
            Err(ModelError::SlotOutOfRange {
                domain: SlotDomain::Global,
                index: 8,
                capacity: 8,
            })
        );
        assert!(state.set_song(32, Song::new(0)).is_err());
        assert!(state.global(8).is_none());
    }

    #[test]
    fn test_reset_empties_libraries_and_keeps_model() {
        let mut state = DeviceState::new(DeviceModel::Mk1);
        state.set_song(0, Song::new(0)).unwrap();
        state.current_kit.set_name("EDITED");
        state.current_global.set_tempo(90.0);
        state.reset();
        assert_eq!(state.model(), DeviceModel::Mk1);
        assert!(state.song(0).is_none());
        assert_eq!(state.current_kit, Kit::new());
        assert_eq!(state.current_global, Global::new(0));
    }
}
