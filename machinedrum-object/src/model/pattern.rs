use super::{fixed_array, RawDump, TRACK_COUNT};
use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_STEPS: usize = 64;
pub const STEP_BYTES: usize = MAX_STEPS / 8;
pub const DEFAULT_LENGTH: u8 = 16;
/// Patterns longer than this need the extended flag.
pub const BASIC_LENGTH: u8 = 32;
pub const LOCK_ROWS: usize = 64;
pub const LOCK_COLUMNS: usize = 32;
pub const DEFAULT_SWING: u8 = 50;

/// One bit per step, step `n` is bit `n % 8` of byte `n / 8`.
///
/// Always 64 steps wide no matter how long the pattern is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepBits(pub [u8; STEP_BYTES]);

impl StepBits {
    pub const fn as_bytes(&self) -> &[u8; STEP_BYTES] {
        &self.0
    }

    pub fn get(&self, step: usize) -> bool {
        step < MAX_STEPS && self.0[step / 8] & (1 << (step % 8)) != 0
    }

    pub fn set(&mut self, step: usize, on: bool) -> Result<(), ModelError> {
        if step >= MAX_STEPS {
            return Err(ModelError::StepOutOfRange(step));
        }
        let mask = 1 << (step % 8);
        if on {
            self.0[step / 8] |= mask;
        } else {
            self.0[step / 8] &= !mask;
        }
        Ok(())
    }

    pub fn toggle(&mut self, step: usize) -> Result<bool, ModelError> {
        let on = !self.get(step);
        self.set(step, on)?;
        Ok(on)
    }

    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }

    /// Set steps below `length`, the ones a pattern of that length actually plays.
    pub fn iter_active(&self, length: usize) -> impl Iterator<Item = usize> + '_ {
        (0..length.min(MAX_STEPS)).filter(move |step| self.get(*step))
    }

    pub fn clear(&mut self) {
        self.0 = [0; STEP_BYTES];
    }
}

/// Step attributes that can be edited for all tracks at once or per track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFlag {
    Accent,
    Swing,
    Slide,
}

/// A parameter lock. Order in [`Pattern::locks`] is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamLock {
    pub track: u8,
    pub param: u8,
    pub step: u8,
    pub value: u8,
}

type LockMatrix = [[u8; LOCK_COLUMNS]; LOCK_ROWS];

fn clamped_number<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u8::deserialize(deserializer)?.min(127))
}

fn clamped_length<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u8::deserialize(deserializer)?.clamp(1, MAX_STEPS as u8))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    #[serde(deserialize_with = "clamped_number")]
    pub pattern_number: u8,
    pub extended_flag: bool,
    #[serde(deserialize_with = "clamped_length")]
    pub length: u8,
    pub tempo_mult: u8,
    pub swing_amount: u8,
    pub assigned_kit_number: u8,
    pub accent_amount: u8,
    pub scale: u8,

    pub trig_bits_per_track: [StepBits; TRACK_COUNT],
    pub accent_bits_global: StepBits,
    pub accent_bits_per_track: [StepBits; TRACK_COUNT],
    pub swing_bits_global: StepBits,
    pub swing_bits_per_track: [StepBits; TRACK_COUNT],
    pub slide_bits_global: StepBits,
    pub slide_bits_per_track: [StepBits; TRACK_COUNT],

    pub accent_edit_all: bool,
    pub swing_edit_all: bool,
    pub slide_edit_all: bool,
    pub track_accent_masks: [u32; TRACK_COUNT],
    pub track_slide_masks: [u32; TRACK_COUNT],
    pub track_swing_masks: [u32; TRACK_COUNT],

    pub locks: Vec<ParamLock>,
    #[serde(with = "fixed_array")]
    pub param_matrix_main: LockMatrix,
    #[serde(with = "fixed_array")]
    pub param_matrix_extra: LockMatrix,

    #[serde(skip)]
    pub raw_pattern: Option<RawDump>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Pattern {
    /// An empty pattern for slot `number`, clamped to the last slot.
    pub fn new(number: u8) -> Self {
        Self {
            pattern_number: number.min(127),
            extended_flag: false,
            length: DEFAULT_LENGTH,
            tempo_mult: 0,
            swing_amount: DEFAULT_SWING,
            assigned_kit_number: 0,
            accent_amount: 0,
            scale: 0,
            trig_bits_per_track: [StepBits::default(); TRACK_COUNT],
            accent_bits_global: StepBits::default(),
            accent_bits_per_track: [StepBits::default(); TRACK_COUNT],
            swing_bits_global: StepBits::default(),
            swing_bits_per_track: [StepBits::default(); TRACK_COUNT],
            slide_bits_global: StepBits::default(),
            slide_bits_per_track: [StepBits::default(); TRACK_COUNT],
            accent_edit_all: true,
            swing_edit_all: true,
            slide_edit_all: true,
            track_accent_masks: [0; TRACK_COUNT],
            track_slide_masks: [0; TRACK_COUNT],
            track_swing_masks: [0; TRACK_COUNT],
            locks: Vec::new(),
            param_matrix_main: [[0; LOCK_COLUMNS]; LOCK_ROWS],
            param_matrix_extra: [[0; LOCK_COLUMNS]; LOCK_ROWS],
            raw_pattern: None,
        }
    }

    pub fn with_raw(number: u8, raw: RawDump) -> Self {
        Self {
            raw_pattern: Some(raw),
            ..Self::new(number)
        }
    }

    /// Sets the length in steps, clamped to 1..=64. The extended flag follows the length.
    pub fn set_length(&mut self, length: u8) {
        self.length = length.clamp(1, MAX_STEPS as u8);
        self.extended_flag = self.length > BASIC_LENGTH;
    }

    fn track_bits_mut(
        per_track: &mut [StepBits; TRACK_COUNT],
        track: usize,
    ) -> Result<&mut StepBits, ModelError> {
        per_track
            .get_mut(track)
            .ok_or(ModelError::TrackOutOfRange(track))
    }

    pub fn trig(&self, track: usize, step: usize) -> bool {
        self.trig_bits_per_track
            .get(track)
            .is_some_and(|bits| bits.get(step))
    }

    pub fn set_trig(&mut self, track: usize, step: usize, on: bool) -> Result<(), ModelError> {
        Self::track_bits_mut(&mut self.trig_bits_per_track, track)?.set(step, on)
    }

    /// Steps of `track` with a trig that fall inside the pattern length.
    pub fn active_trigs(&self, track: usize) -> Vec<usize> {
        self.trig_bits_per_track
            .get(track)
            .map(|bits| bits.iter_active(usize::from(self.length)).collect())
            .unwrap_or_default()
    }

    fn flag_parts(&self, flag: StepFlag) -> (bool, &StepBits, &[StepBits; TRACK_COUNT]) {
        match flag {
            StepFlag::Accent => (
                self.accent_edit_all,
                &self.accent_bits_global,
                &self.accent_bits_per_track,
            ),
            StepFlag::Swing => (
                self.swing_edit_all,
                &self.swing_bits_global,
                &self.swing_bits_per_track,
            ),
            StepFlag::Slide => (
                self.slide_edit_all,
                &self.slide_bits_global,
                &self.slide_bits_per_track,
            ),
        }
    }

    /// Whether `flag` applies to `step` of `track`, reading the global vector when the
    /// flag is edited for all tracks.
    pub fn step_flag(&self, flag: StepFlag, track: usize, step: usize) -> bool {
        let (edit_all, global, per_track) = self.flag_parts(flag);
        if edit_all {
            global.get(step)
        } else {
            per_track.get(track).is_some_and(|bits| bits.get(step))
        }
    }

    /// Writes `flag` for `step`, into the global vector or the vector of `track`
    /// depending on the edit mode of that flag.
    pub fn set_step_flag(
        &mut self,
        flag: StepFlag,
        track: usize,
        step: usize,
        on: bool,
    ) -> Result<(), ModelError> {
        if track >= TRACK_COUNT {
            return Err(ModelError::TrackOutOfRange(track));
        }
        let (edit_all, global, per_track) = match flag {
            StepFlag::Accent => (
                self.accent_edit_all,
                &mut self.accent_bits_global,
                &mut self.accent_bits_per_track,
            ),
            StepFlag::Swing => (
                self.swing_edit_all,
                &mut self.swing_bits_global,
                &mut self.swing_bits_per_track,
            ),
            StepFlag::Slide => (
                self.slide_edit_all,
                &mut self.slide_bits_global,
                &mut self.slide_bits_per_track,
            ),
        };
        if edit_all {
            global.set(step, on)
        } else {
            Self::track_bits_mut(per_track, track)?.set(step, on)
        }
    }

    /// Every step bit vector of the pattern.
    pub fn all_step_bits(&self) -> impl Iterator<Item = &StepBits> {
        self.trig_bits_per_track
            .iter()
            .chain(std::iter::once(&self.accent_bits_global))
            .chain(self.accent_bits_per_track.iter())
            .chain(std::iter::once(&self.swing_bits_global))
            .chain(self.swing_bits_per_track.iter())
            .chain(std::iter::once(&self.slide_bits_global))
            .chain(self.slide_bits_per_track.iter())
    }
}
