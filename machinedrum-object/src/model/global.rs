use super::{fixed_array, TRACK_COUNT};
use serde::{Deserialize, Deserializer, Serialize};

pub const GLOBAL_SLOT_COUNT: usize = 8;
pub const KEYMAP_LEN: usize = 128;
/// Keymap entry of a note that triggers nothing.
pub const NO_TRIGGER: u8 = 0x7F;
/// Notes mapped to tracks 0 to 15 on a fresh global.
pub const DEFAULT_KEYMAP_NOTES: [u8; TRACK_COUNT] =
    [36, 38, 40, 41, 43, 45, 47, 48, 50, 52, 53, 55, 57, 59, 60, 62];
/// Drum routing value sending a track to the main outputs.
pub const ROUTE_MAIN: u8 = 6;
pub const DEFAULT_TEMPO: f32 = 120.0;
pub const MIN_TEMPO: f32 = 30.0;
pub const MAX_TEMPO: f32 = 300.0;

fn default_keymap() -> [u8; KEYMAP_LEN] {
    let mut keymap = [NO_TRIGGER; KEYMAP_LEN];
    for (track, note) in DEFAULT_KEYMAP_NOTES.iter().enumerate() {
        keymap[usize::from(*note)] = track as u8;
    }
    keymap
}

fn clamped_position<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u8::deserialize(deserializer)?.min(GLOBAL_SLOT_COUNT as u8 - 1))
}

/// Device wide settings, one of eight slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Global {
    #[serde(deserialize_with = "clamped_position")]
    global_position: u8,
    pub tempo: f32,
    pub midi_base: u8,
    pub mechanical_settings: u8,
    pub extended_mode: bool,
    pub flags: u8,
    pub local_on: bool,
    pub drum_routing: [u8; TRACK_COUNT],
    #[serde(with = "fixed_array")]
    pub keymap: [u8; KEYMAP_LEN],
    pub program_change: u8,
    pub trig_mode: u8,
    pub drum_left: u8,
    pub drum_right: u8,
    pub gate_left: u8,
    pub gate_right: u8,
    pub sense_left: u8,
    pub sense_right: u8,
    pub min_level_left: u8,
    pub min_level_right: u8,
    pub max_level_left: u8,
    pub max_level_right: u8,
}

impl Default for Global {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Global {
    /// A fresh global for slot `position`, clamped into 0..=7.
    pub fn new(position: u8) -> Self {
        Self {
            global_position: position.min(GLOBAL_SLOT_COUNT as u8 - 1),
            tempo: DEFAULT_TEMPO,
            midi_base: 0,
            mechanical_settings: 0,
            extended_mode: true,
            flags: 0,
            local_on: true,
            drum_routing: [ROUTE_MAIN; TRACK_COUNT],
            keymap: default_keymap(),
            program_change: 0,
            trig_mode: 0,
            drum_left: 0,
            drum_right: 0,
            gate_left: 0,
            gate_right: 0,
            sense_left: 0,
            sense_right: 0,
            min_level_left: 0,
            min_level_right: 0,
            max_level_left: 127,
            max_level_right: 127,
        }
    }

    pub const fn position(&self) -> u8 {
        self.global_position
    }

    pub fn set_position(&mut self, position: u8) {
        self.global_position = position.min(GLOBAL_SLOT_COUNT as u8 - 1);
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo = if bpm.is_finite() {
            bpm.clamp(MIN_TEMPO, MAX_TEMPO)
        } else {
            DEFAULT_TEMPO
        };
    }

    /// The track `note` triggers, if any. Notes above 127 trigger nothing.
    pub fn track_for_note(&self, note: u8) -> Option<u8> {
        self.keymap
            .get(usize::from(note))
            .copied()
            .filter(|track| *track != NO_TRIGGER)
    }

    /// Points `note` at `track`. Returns false when either is out of range.
    pub fn map_note(&mut self, note: u8, track: u8) -> bool {
        if usize::from(track) >= TRACK_COUNT {
            return false;
        }
        self.keymap
            .get_mut(usize::from(note))
            .map(|entry| *entry = track)
            .is_some()
    }

    pub fn unmap_note(&mut self, note: u8) {
        if let Some(entry) = self.keymap.get_mut(usize::from(note)) {
            *entry = NO_TRIGGER;
        }
    }

    /// Clamps every seven bit field back into 0..=127, e.g. after an import.
    pub fn clamp_fields(&mut self) {
        for field in [
            &mut self.midi_base,
            &mut self.mechanical_settings,
            &mut self.flags,
            &mut self.program_change,
            &mut self.trig_mode,
            &mut self.drum_left,
            &mut self.drum_right,
            &mut self.gate_left,
            &mut self.gate_right,
            &mut self.sense_left,
            &mut self.sense_right,
            &mut self.min_level_left,
            &mut self.min_level_right,
            &mut self.max_level_left,
            &mut self.max_level_right,
        ] {
            *field = (*field).min(127);
        }
        for value in self.drum_routing.iter_mut().chain(self.keymap.iter_mut()) {
            *value = (*value).min(127);
        }
    }
}
