use super::{fixed_array, RawDump, PARAMS_PER_TRACK, TRACK_COUNT};
use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize};

pub const LFO_BLOCK_LEN: usize = 36;
pub const MASTER_FX_LEN: usize = 32;
pub const KIT_NAME_LEN: usize = 16;

/// Mute and trig relations point at another track, this one means none.
pub const NO_RELATION: u8 = 128;
pub const DEFAULT_TRACK_LEVEL: u8 = 100;
pub const DEFAULT_KIT_NAME: &str = "DEFAULT";

/// Rhythm echo, gate box, EQ and dynamix, eight parameters each, as the machine
/// initializes a new kit.
pub const MASTER_FX_DEFAULTS: [u8; MASTER_FX_LEN] = [
    // rhythm echo: TIME MOD MFRQ FB FILTF FILTW MONO LEV
    24, 0, 0, 32, 0, 127, 0, 0, //
    // gate box: DVOL PRED DEC DAMP HP LP GATE LEV
    0, 0, 64, 0, 0, 127, 0, 0, //
    // eq: LF LG HF HG PF PG PQ GAIN
    0, 64, 127, 64, 64, 64, 64, 64, //
    // dynamix: ATCK REL THR RAT KNEE HP OUTG MIX
    0, 64, 127, 0, 0, 0, 64, 127,
];

/// AMD AMF EQF EQG FLTF FLTW FLTQ SRR
pub const TRACK_FX_DEFAULTS: [u8; PARAMS_PER_TRACK] = [0, 0, 64, 64, 0, 127, 0, 0];
/// DIST VOL PAN DEL REV LFOS LFOD LFOM
pub const ROUTING_DEFAULTS: [u8; PARAMS_PER_TRACK] = [0, 100, 64, 0, 0, 64, 0, 0];

fn truncated_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?
        .chars()
        .take(KIT_NAME_LEN)
        .collect())
}

/// Raw LFO configuration of one track. Byte 0 is the track the LFO belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LfoBlock(#[serde(with = "fixed_array")] pub [u8; LFO_BLOCK_LEN]);

impl LfoBlock {
    pub fn for_track(track: usize) -> Self {
        let mut block = [0; LFO_BLOCK_LEN];
        block[0] = track as u8;
        Self(block)
    }

    pub const fn track(&self) -> u8 {
        self.0[0]
    }
}

/// Configuration of the 16 tracks of the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kit {
    pub machine_assignments: [u8; TRACK_COUNT],
    pub machine_tonal_flags: [bool; TRACK_COUNT],
    pub machine_params: [[u8; PARAMS_PER_TRACK]; TRACK_COUNT],
    pub track_fx: [[u8; PARAMS_PER_TRACK]; TRACK_COUNT],
    pub routing: [[u8; PARAMS_PER_TRACK]; TRACK_COUNT],
    pub mute_trig_relations: [(u8, u8); TRACK_COUNT],
    pub lfo_blocks: [LfoBlock; TRACK_COUNT],
    pub master_fx: [u8; MASTER_FX_LEN],
    pub track_levels: [u8; TRACK_COUNT],
    #[serde(deserialize_with = "truncated_name")]
    pub kit_name: String,
    #[serde(skip)]
    pub raw_kit: Option<RawDump>,
}

impl Default for Kit {
    fn default() -> Self {
        Self {
            machine_assignments: [0; TRACK_COUNT],
            machine_tonal_flags: [false; TRACK_COUNT],
            machine_params: [[0; PARAMS_PER_TRACK]; TRACK_COUNT],
            track_fx: [TRACK_FX_DEFAULTS; TRACK_COUNT],
            routing: [ROUTING_DEFAULTS; TRACK_COUNT],
            mute_trig_relations: [(NO_RELATION, NO_RELATION); TRACK_COUNT],
            lfo_blocks: std::array::from_fn(LfoBlock::for_track),
            master_fx: MASTER_FX_DEFAULTS,
            track_levels: [DEFAULT_TRACK_LEVEL; TRACK_COUNT],
            kit_name: DEFAULT_KIT_NAME.to_owned(),
            raw_kit: None,
        }
    }
}

fn check_track(track: usize) -> Result<(), ModelError> {
    if track < TRACK_COUNT {
        Ok(())
    } else {
        Err(ModelError::TrackOutOfRange(track))
    }
}

impl Kit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kit derived from a device dump, keeping the dump around for later re-encoding.
    pub fn with_raw(raw: RawDump) -> Self {
        Self {
            raw_kit: Some(raw),
            ..Self::default()
        }
    }

    /// Sets the name, cut to the width of the device display.
    pub fn set_name(&mut self, name: &str) {
        self.kit_name = name.chars().take(KIT_NAME_LEN).collect();
    }

    /// The name padded with spaces to the device display width.
    pub fn display_name(&self) -> String {
        format!("{:<width$}", self.kit_name, width = KIT_NAME_LEN)
    }

    pub fn machine(&self, track: usize) -> Option<u8> {
        self.machine_assignments.get(track).copied()
    }

    pub fn set_machine(&mut self, track: usize, machine_id: u8, tonal: bool) -> Result<(), ModelError> {
        check_track(track)?;
        self.machine_assignments[track] = machine_id;
        self.machine_tonal_flags[track] = tonal;
        Ok(())
    }

    /// Writes a machine parameter, values above 127 are clamped.
    pub fn set_param(&mut self, track: usize, param: usize, value: u8) -> Result<(), ModelError> {
        check_track(track)?;
        if param >= PARAMS_PER_TRACK {
            return Err(ModelError::ParamOutOfRange(param));
        }
        self.machine_params[track][param] = value.min(127);
        Ok(())
    }

    pub fn set_track_level(&mut self, track: usize, level: u8) -> Result<(), ModelError> {
        check_track(track)?;
        self.track_levels[track] = level.min(127);
        Ok(())
    }

    /// Tracks whose LFO block does not belong to them, which only a loaded dump can cause.
    pub fn foreign_lfo_tracks(&self) -> Vec<usize> {
        self.lfo_blocks
            .iter()
            .enumerate()
            .filter(|(t, block)| usize::from(block.track()) != *t)
            .map(|(t, _)| t)
            .collect()
    }
}
