//! Machine id to name resolution, gated by what the connected hardware can run.

use crate::types::{DeviceModel, OsVersion};
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Highest id of the machines every model ships with.
pub const BUILTIN_MAX_ID: u8 = 123;

/// First ROM machine id, ROM-01.
pub const ROM_BASE: u8 = 128;
/// ROM slots addressable through the contiguous range starting at [`ROM_BASE`].
pub const ROM_CONTIGUOUS_COUNT: usize = 32;
/// ROM-33 onwards live in a second range after the RAM machines.
pub const ROM_EXTENDED_BASE: u8 = 176;
pub const ROM_EXTENDED_COUNT: usize = 16;

/// RAM machines in the order they become available, a record and a play machine per buffer.
pub const RAM_RECORD_PLAY_IDS: [u8; 8] = [160, 161, 162, 163, 165, 166, 167, 168];

/// Machine id whose name changes on the 1.63 firmware.
pub const QUIRK_163_MACHINE_ID: u8 = 1;
pub const QUIRK_163_NAME: &str = "GND-SW";

const BUILTIN_MACHINES: &[(u8, &str)] = &[
    (0, "GND-EMPTY"),
    (1, "GND-SN"),
    (2, "GND-NS"),
    (3, "GND-IM"),
    (16, "TRX-BD"),
    (17, "TRX-SD"),
    (18, "TRX-XT"),
    (19, "TRX-CP"),
    (20, "TRX-RS"),
    (21, "TRX-CB"),
    (22, "TRX-CH"),
    (23, "TRX-OH"),
    (24, "TRX-CY"),
    (25, "TRX-MA"),
    (26, "TRX-CL"),
    (27, "TRX-XC"),
    (28, "TRX-B2"),
    (29, "TRX-S2"),
    (32, "EFM-BD"),
    (33, "EFM-SD"),
    (34, "EFM-XT"),
    (35, "EFM-CP"),
    (36, "EFM-RS"),
    (37, "EFM-CB"),
    (38, "EFM-HH"),
    (39, "EFM-CY"),
    (48, "E12-BD"),
    (49, "E12-SD"),
    (50, "E12-HT"),
    (51, "E12-LT"),
    (52, "E12-CP"),
    (53, "E12-RS"),
    (54, "E12-CB"),
    (55, "E12-CH"),
    (56, "E12-OH"),
    (57, "E12-RC"),
    (58, "E12-CC"),
    (59, "E12-BR"),
    (60, "E12-TA"),
    (61, "E12-TR"),
    (62, "E12-SH"),
    (63, "E12-BC"),
    (64, "P-I BD"),
    (65, "P-I SD"),
    (66, "P-I MT"),
    (67, "P-I ML"),
    (68, "P-I MA"),
    (69, "P-I RS"),
    (70, "P-I RC"),
    (71, "P-I CC"),
    (72, "P-I HH"),
    (80, "INP-GA"),
    (81, "INP-GB"),
    (82, "INP-FA"),
    (83, "INP-FB"),
    (84, "INP-EA"),
    (85, "INP-EB"),
    (112, "CTR-AL"),
    (113, "CTR-8P"),
    (120, "CTR-RE"),
    (121, "CTR-GB"),
    (122, "CTR-EQ"),
    (123, "CTR-DX"),
];

const RAM_MACHINE_NAMES: [&str; 8] = [
    "RAM-R1", "RAM-R2", "RAM-P1", "RAM-P2", "RAM-R3", "RAM-R4", "RAM-P3", "RAM-P4",
];

lazy_static! {
    static ref MACHINE_NAMES: BTreeMap<u8, String> = {
        let mut m = BTreeMap::new();

        BUILTIN_MACHINES.iter().for_each(|(id, name)| {
            m.insert(*id, (*name).to_owned());
        });

        // MIDI machines, MID-01 to MID-16
        (0..16u8).for_each(|i| {
            m.insert(96 + i, format!("MID-{:02}", i + 1));
        });

        (0..ROM_CONTIGUOUS_COUNT as u8).for_each(|i| {
            m.insert(ROM_BASE + i, format!("ROM-{:02}", i + 1));
        });

        (0..ROM_EXTENDED_COUNT as u8).for_each(|i| {
            m.insert(
                ROM_EXTENDED_BASE + i,
                format!("ROM-{:02}", ROM_CONTIGUOUS_COUNT as u8 + i + 1),
            );
        });

        RAM_RECORD_PLAY_IDS
            .iter()
            .zip(RAM_MACHINE_NAMES)
            .for_each(|(id, name)| {
                m.insert(*id, name.to_owned());
            });

        m
    };
}

/// The static name of a machine, without any firmware specific renaming.
pub fn static_name(id: u8) -> Option<&'static str> {
    MACHINE_NAMES.get(&id).map(String::as_str)
}

pub fn is_rom(id: u8) -> bool {
    (ROM_BASE..ROM_BASE + ROM_CONTIGUOUS_COUNT as u8).contains(&id)
        || (ROM_EXTENDED_BASE..ROM_EXTENDED_BASE + ROM_EXTENDED_COUNT as u8).contains(&id)
}

pub fn is_ram_record(id: u8) -> bool {
    matches!(id, 160 | 161 | 165 | 166)
}

pub fn is_ram_play(id: u8) -> bool {
    matches!(id, 162 | 163 | 167 | 168)
}

/// Machine ids `model` can run, mapped to their static names.
///
/// Builtin machines come first, then as many ROM machines as the model has ROM slots
/// (the first 32 contiguous from [`ROM_BASE`], the rest from [`ROM_EXTENDED_BASE`]),
/// then two RAM machines per record/play buffer. Ids without a known name are never
/// produced, whatever the model claims to support.
#[instrument]
pub fn valid_entries_for(model: DeviceModel) -> BTreeMap<u8, &'static str> {
    let mut entries: BTreeMap<u8, &'static str> = MACHINE_NAMES
        .range(..=BUILTIN_MAX_ID)
        .map(|(id, name)| (*id, name.as_str()))
        .collect();

    let rom_slots = model.rom_slot_count();
    let contiguous = rom_slots.min(ROM_CONTIGUOUS_COUNT);
    let extended = rom_slots.saturating_sub(ROM_CONTIGUOUS_COUNT);

    let rom_ids = (0..contiguous)
        .map(|i| ROM_BASE as usize + i)
        .chain((0..extended).map(|i| ROM_EXTENDED_BASE as usize + i));

    let ram_ids = RAM_RECORD_PLAY_IDS
        .iter()
        .take(2 * model.ram_record_play_count())
        .map(|id| *id as usize);

    for id in rom_ids.chain(ram_ids) {
        let Ok(id) = u8::try_from(id) else {
            continue;
        };
        match static_name(id) {
            Some(name) => {
                entries.insert(id, name);
            }
            None => debug!("Machine {} is beyond the known machines of {}.", id, model),
        }
    }

    entries
}

/// Valid machines for `model` with names as the given firmware shows them.
pub fn named_entries_for(model: DeviceModel, os: &OsVersion) -> BTreeMap<u8, Cow<'static, str>> {
    valid_entries_for(model)
        .into_keys()
        .map(|id| (id, name_for(id, os)))
        .collect()
}

/// Display name of a machine on the given firmware.
///
/// Unknown ids resolve to `(unknown #<id>)`.
pub fn name_for(id: u8, os: &OsVersion) -> Cow<'static, str> {
    if id == QUIRK_163_MACHINE_ID && os.is_163() {
        return Cow::Borrowed(QUIRK_163_NAME);
    }

    static_name(id).map_or_else(|| Cow::Owned(format!("(unknown #{id})")), Cow::Borrowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expansion_count(entries: &BTreeMap<u8, &'static str>) -> usize {
        entries.keys().filter(|id| **id > BUILTIN_MAX_ID).count()
    }

    #[test]
    fn test_entries_only_contain_named_machines() {
        for model in DeviceModel::ALL {
            for (id, name) in valid_entries_for(model) {
                assert_eq!(static_name(id), Some(name));
            }
        }
    }

    #[test]
    fn test_expansion_entries_respect_capacity() {
        for model in DeviceModel::ALL {
            let bound = ROM_CONTIGUOUS_COUNT
                + model.rom_slot_count().saturating_sub(ROM_CONTIGUOUS_COUNT)
                + 2 * model.ram_record_play_count();
            assert!(expansion_count(&valid_entries_for(model)) <= bound);
        }
    }

    #[test]
    fn test_plain_models_have_no_rom_or_ram() {
        let entries = valid_entries_for(DeviceModel::Mk2);
        assert_eq!(expansion_count(&entries), 0);
        assert_eq!(entries.get(&16), Some(&"TRX-BD"));
        assert_eq!(entries.get(&100), Some(&"MID-05"));
    }

    #[test]
    fn test_uw_mk1_rom_and_ram() {
        let entries = valid_entries_for(DeviceModel::UwMk1);
        assert_eq!(entries.get(&128), Some(&"ROM-01"));
        assert_eq!(entries.get(&159), Some(&"ROM-32"));
        assert!(!entries.contains_key(&176));
        assert_eq!(entries.get(&160), Some(&"RAM-R1"));
        assert_eq!(entries.get(&163), Some(&"RAM-P2"));
        assert!(!entries.contains_key(&165));
        assert_eq!(expansion_count(&entries), 32 + 4);
    }

    #[test]
    fn test_uw_mk2_uses_extended_rom_range() {
        let entries = valid_entries_for(DeviceModel::UwMk2);
        assert_eq!(entries.get(&176), Some(&"ROM-33"));
        assert_eq!(entries.get(&191), Some(&"ROM-48"));
        assert!(!entries.contains_key(&192));
        assert_eq!(entries.get(&168), Some(&"RAM-P4"));
        assert_eq!(expansion_count(&entries), 48 + 8);
    }

    #[test]
    fn test_name_for_163_override() {
        assert_eq!(name_for(1, &OsVersion::from("1.63")), QUIRK_163_NAME);
        assert_eq!(name_for(1, &OsVersion::from("X")), "GND-SN");
        assert_eq!(name_for(2, &OsVersion::from("1.63")), "GND-NS");
    }

    #[test]
    fn test_name_for_unknown_id() {
        assert_eq!(name_for(7, &OsVersion::default()), "(unknown #7)");
        assert_eq!(name_for(255, &OsVersion::default()), "(unknown #255)");
    }

    #[test]
    fn test_named_entries_follow_firmware() {
        let on_163 = named_entries_for(DeviceModel::Mk1, &OsVersion::from("1.63"));
        let on_170 = named_entries_for(DeviceModel::Mk1, &OsVersion::from("1.70"));
        assert_eq!(on_163[&1], QUIRK_163_NAME);
        assert_eq!(on_170[&1], "GND-SN");
        assert_eq!(on_163.len(), on_170.len());
    }

    #[test]
    fn test_machine_families() {
        assert!(is_rom(128) && is_rom(159) && is_rom(176) && is_rom(191));
        assert!(!is_rom(160) && !is_rom(192));
        assert!(is_ram_record(165) && is_ram_play(162));
        assert!(!is_ram_record(162) && !is_ram_play(160));
    }
}
