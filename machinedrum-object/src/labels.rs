//! Display labels for the eight knobs of each kit track page.

use crate::catalog::{self, QUIRK_163_MACHINE_ID};
use crate::types::OsVersion;
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

/// Returned for categories that have no per-parameter labels.
pub const NOT_APPLICABLE: &str = "n/a";

/// Parameters of the sine machine that stay visible on the 1.63 firmware.
pub const QUIRK_163_VISIBLE_PARAMS: usize = 4;

/// Machine whose track effect page is repurposed.
pub const TRACK_FX_OVERRIDE_MACHINE_ID: u8 = 113;

type LabelRow = [&'static str; 8];

const TRACK_FX_LABELS: LabelRow = ["AMD", "AMF", "EQF", "EQG", "FLTF", "FLTW", "FLTQ", "SRR"];
const TRACK_FX_OVERRIDE_LABELS: LabelRow =
    ["P1T", "P1P", "P2T", "P2P", "P3T", "P3P", "P4T", "P4P"];
const ROUTING_LABELS: LabelRow = ["DIST", "VOL", "PAN", "DEL", "REV", "LFOS", "LFOD", "LFOM"];

const E12_LABELS: LabelRow = ["PTCH", "DEC", "SNAP", "RTRG", "RTIM", "SRR", "STRT", "BEND"];
const MID_LABELS: LabelRow = ["NOTE", "N2", "N3", "LEN", "VEL", "PB", "MW", "AT"];
const ROM_LABELS: LabelRow = ["PTCH", "DEC", "HOLD", "BRR", "STRT", "END", "RTRG", "RTIM"];
const RAM_RECORD_LABELS: LabelRow = ["MLEV", "MBAL", "ILEV", "IBAL", "CUE", "LEN", "RATE", "DEC"];

lazy_static! {
    static ref MACHINE_PARAM_LABELS: HashMap<u8, LabelRow> = {
        let mut m = HashMap::new();

        m.insert(1, ["PTCH", "DEC", "RAMP", "RDEC", "HARM", "SKEW", "NOIS", "MOD"]);
        m.insert(2, ["DEC", "", "", "", "", "", "", ""]);
        m.insert(3, ["UP", "UVAL", "DOWN", "DVAL", "", "", "", ""]);

        m.insert(16, ["PTCH", "DEC", "RAMP", "RDEC", "STRT", "NOIS", "HARM", "CLIP"]);
        m.insert(17, ["PTCH", "DEC", "BUMP", "BENV", "SNAP", "TONE", "TUNE", "CLIP"]);
        m.insert(18, ["PTCH", "DEC", "RAMP", "RDEC", "DAMP", "DIST", "DTYP", ""]);
        m.insert(19, ["CLPY", "TONE", "HARD", "RICH", "RATE", "ROOM", "RSIZ", "RTUN"]);
        m.insert(20, ["PTCH", "DEC", "DIST", "", "", "", "", ""]);
        m.insert(21, ["PTCH", "DEC", "ENH", "DAMP", "TONE", "BUMP", "", ""]);
        m.insert(22, ["GAP", "DEC", "", "", "", "", "", ""]);
        m.insert(23, ["GAP", "DEC", "", "", "", "", "", ""]);
        m.insert(24, ["RICH", "DEC", "TOP", "TTUN", "SIZE", "PEAK", "", ""]);
        m.insert(25, ["ATT", "SUS", "REV", "DAMP", "RTRG", "RTYP", "TONE", "HARD"]);
        m.insert(26, ["PTCH", "DEC", "DUAL", "ENH", "TUNE", "CLIC", "", ""]);
        m.insert(27, ["PTCH", "DEC", "RAMP", "RDEC", "DAMP", "DIST", "DTYP", ""]);
        m.insert(28, ["PTCH", "DEC", "RAMP", "HOLD", "TICK", "NOIS", "DIRT", "DIST"]);

        m.insert(32, ["PTCH", "DEC", "RAMP", "RDEC", "MOD", "MFRQ", "MDEC", "MFB"]);
        m.insert(33, ["PTCH", "DEC", "NOIS", "NDEC", "MOD", "MFRQ", "MDEC", "HPF"]);
        m.insert(38, ["PTCH", "DEC", "TREM", "TFRQ", "MOD", "MFRQ", "MDEC", "MFB"]);

        m.insert(64, ["PTCH", "DEC", "HARD", "HAMR", "TENS", "DAMP", "", ""]);

        m.insert(80, ["VOL", "GATE", "ATCK", "HLD", "DEC", "", "", ""]);
        m.insert(81, ["VOL", "GATE", "ATCK", "HLD", "DEC", "", "", ""]);

        m.insert(113, ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8"]);

        m
    };
}

/// Which page of a kit track a parameter index refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParamCategory {
    MachineParams,
    TrackFx,
    Routing,
    Lfo,
    MasterFx,
}

impl FromStr for ParamCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "machineParams" | "machine_params" => Ok(Self::MachineParams),
            "trackFx" | "track_fx" => Ok(Self::TrackFx),
            "routing" => Ok(Self::Routing),
            "lfo" | "lfoBlocks" => Ok(Self::Lfo),
            "masterFx" | "master_fx" => Ok(Self::MasterFx),
            _ => Err(()),
        }
    }
}

fn machine_row(machine_id: u8) -> Option<&'static LabelRow> {
    if let Some(row) = MACHINE_PARAM_LABELS.get(&machine_id) {
        return Some(row);
    }
    match machine_id {
        48..=63 => Some(&E12_LABELS),
        96..=111 => Some(&MID_LABELS),
        id if catalog::is_rom(id) || catalog::is_ram_play(id) => Some(&ROM_LABELS),
        id if catalog::is_ram_record(id) => Some(&RAM_RECORD_LABELS),
        _ => None,
    }
}

fn from_row(row: &LabelRow, index: usize) -> Option<&'static str> {
    row.get(index).copied().filter(|label| !label.is_empty())
}

fn machine_param_label(machine_id: u8, index: usize, os: &OsVersion) -> Cow<'static, str> {
    let hidden_on_163 =
        machine_id == QUIRK_163_MACHINE_ID && os.is_163() && index >= QUIRK_163_VISIBLE_PARAMS;

    machine_row(machine_id)
        .filter(|_| !hidden_on_163)
        .and_then(|row| from_row(row, index))
        .map_or_else(|| Cow::Owned(format!("Param{}", index + 1)), Cow::Borrowed)
}

/// Label of parameter `index` on the given page of a track running `machine_id`.
///
/// Unset or out of range indices fall back to `Param<N>`, `FX<N>` or `Route<N>`, counting
/// from one. Pages without per-parameter labels give [`NOT_APPLICABLE`].
pub fn label_for(
    machine_id: u8,
    index: usize,
    category: ParamCategory,
    os: &OsVersion,
) -> Cow<'static, str> {
    match category {
        ParamCategory::MachineParams => machine_param_label(machine_id, index, os),
        ParamCategory::TrackFx => {
            let row = if machine_id == TRACK_FX_OVERRIDE_MACHINE_ID {
                &TRACK_FX_OVERRIDE_LABELS
            } else {
                &TRACK_FX_LABELS
            };
            from_row(row, index)
                .map_or_else(|| Cow::Owned(format!("FX{}", index + 1)), Cow::Borrowed)
        }
        ParamCategory::Routing => from_row(&ROUTING_LABELS, index)
            .map_or_else(|| Cow::Owned(format!("Route{}", index + 1)), Cow::Borrowed),
        ParamCategory::Lfo | ParamCategory::MasterFx => Cow::Borrowed(NOT_APPLICABLE),
    }
}

/// Same as [`label_for`] with the category given by name, unknown names give [`NOT_APPLICABLE`].
pub fn label_for_key(
    machine_id: u8,
    index: usize,
    category: &str,
    os: &OsVersion,
) -> Cow<'static, str> {
    category.parse().map_or_else(
        |()| {
            tracing::debug!("No labels for category {}.", category);
            Cow::Borrowed(NOT_APPLICABLE)
        },
        |category| label_for(machine_id, index, category, os),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(v: &str) -> OsVersion {
        OsVersion::from(v)
    }

    #[test]
    fn test_machine_param_labels() {
        let v = os("1.70");
        assert_eq!(label_for(16, 0, ParamCategory::MachineParams, &v), "PTCH");
        assert_eq!(label_for(16, 7, ParamCategory::MachineParams, &v), "CLIP");
        assert_eq!(label_for(20, 3, ParamCategory::MachineParams, &v), "Param4");
        assert_eq!(label_for(16, 8, ParamCategory::MachineParams, &v), "Param9");
        assert_eq!(label_for(7, 0, ParamCategory::MachineParams, &v), "Param1");
    }

    #[test]
    fn test_machine_families_share_labels() {
        let v = os("1.70");
        assert_eq!(label_for(55, 1, ParamCategory::MachineParams, &v), "DEC");
        assert_eq!(label_for(100, 0, ParamCategory::MachineParams, &v), "NOTE");
        assert_eq!(label_for(180, 2, ParamCategory::MachineParams, &v), "HOLD");
        assert_eq!(label_for(162, 2, ParamCategory::MachineParams, &v), "HOLD");
        assert_eq!(label_for(160, 0, ParamCategory::MachineParams, &v), "MLEV");
    }

    #[test]
    fn test_sine_machine_on_163_hides_upper_params() {
        let quirk = os("1.63");
        let normal = os("1.62");
        assert_eq!(label_for(1, 3, ParamCategory::MachineParams, &quirk), "RDEC");
        assert_eq!(label_for(1, 4, ParamCategory::MachineParams, &quirk), "Param5");
        assert_eq!(label_for(1, 7, ParamCategory::MachineParams, &quirk), "Param8");
        assert_eq!(label_for(1, 4, ParamCategory::MachineParams, &normal), "HARM");
        // Only the sine machine is affected.
        assert_eq!(label_for(16, 4, ParamCategory::MachineParams, &quirk), "STRT");
    }

    #[test]
    fn test_track_fx_labels() {
        let v = os("1.70");
        assert_eq!(label_for(16, 0, ParamCategory::TrackFx, &v), "AMD");
        assert_eq!(label_for(16, 7, ParamCategory::TrackFx, &v), "SRR");
        assert_eq!(label_for(113, 0, ParamCategory::TrackFx, &v), "P1T");
        assert_eq!(label_for(113, 8, ParamCategory::TrackFx, &v), "FX9");
        assert_eq!(label_for(16, 12, ParamCategory::TrackFx, &v), "FX13");
    }

    #[test]
    fn test_routing_labels() {
        let v = os("1.70");
        assert_eq!(label_for(0, 1, ParamCategory::Routing, &v), "VOL");
        assert_eq!(label_for(0, 8, ParamCategory::Routing, &v), "Route9");
    }

    #[test]
    fn test_other_categories_are_not_applicable() {
        let v = os("1.70");
        assert_eq!(label_for(16, 0, ParamCategory::Lfo, &v), NOT_APPLICABLE);
        assert_eq!(label_for_key(16, 0, "masterFx", &v), NOT_APPLICABLE);
        assert_eq!(label_for_key(16, 0, "bogus", &v), NOT_APPLICABLE);
        assert_eq!(label_for_key(16, 0, "trackFx", &v), "AMD");
        assert_eq!(label_for_key(16, 0, "machineParams", &v), "PTCH");
    }
}
