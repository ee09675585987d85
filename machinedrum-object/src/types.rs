use crate::error::{ParseError, SlotAddressError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Hardware revision of the connected machine.
///
/// The revision decides how many ROM and RAM machines are legal, which in turn gates the
/// machine ids a kit track may be assigned.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceModel {
    Mk1,
    Mk2,
    UwMk1,
    #[default]
    UwMk2,
}

impl DeviceModel {
    pub const ALL: [Self; 4] = [Self::Mk1, Self::Mk2, Self::UwMk1, Self::UwMk2];

    /// Number of ROM sample slots the machine exposes as ROM machines.
    pub const fn rom_slot_count(self) -> usize {
        match self {
            Self::Mk1 | Self::Mk2 => 0,
            Self::UwMk1 => 32,
            Self::UwMk2 => 48,
        }
    }

    /// Number of RAM record/play machine pairs.
    pub const fn ram_record_play_count(self) -> usize {
        match self {
            Self::Mk1 | Self::Mk2 => 0,
            Self::UwMk1 => 2,
            Self::UwMk2 => 4,
        }
    }

    pub const fn kit_capacity(self) -> usize {
        64
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mk1 => "mk1",
            Self::Mk2 => "mk2",
            Self::UwMk1 => "uw_mk1",
            Self::UwMk2 => "uw_mk2",
        }
    }
}

impl std::fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceModel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mk1" => Ok(Self::Mk1),
            "mk2" => Ok(Self::Mk2),
            "uw_mk1" | "uwmk1" => Ok(Self::UwMk1),
            "uw_mk2" | "uwmk2" => Ok(Self::UwMk2),
            other => Err(ParseError::InvalidDeviceModel(other.to_owned())),
        }
    }
}

/// Firmware version string as reported by the device, e.g. `1.63`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OsVersion(String);

impl OsVersion {
    /// The firmware release where the sine machine loses half of its controls.
    pub const QUIRK_163: &'static str = "1.63";
    pub const DEFAULT: &'static str = "1.70";

    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_163(&self) -> bool {
        self.0 == Self::QUIRK_163
    }
}

impl Default for OsVersion {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl std::fmt::Display for OsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OsVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The four slot libraries of the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotDomain {
    Global,
    Song,
    Kit,
    Pattern,
}

impl SlotDomain {
    pub const ALL: [Self; 4] = [Self::Global, Self::Song, Self::Kit, Self::Pattern];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Song => "song",
            Self::Kit => "kit",
            Self::Pattern => "pattern",
        }
    }
}

impl std::fmt::Display for SlotDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SlotDomain {
    type Err = SlotAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "song" => Ok(Self::Song),
            "kit" => Ok(Self::Kit),
            "pattern" => Ok(Self::Pattern),
            other => Err(SlotAddressError::InvalidDomain(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_model_parses_its_own_names() {
        for model in DeviceModel::ALL {
            assert_eq!(model.as_str().parse::<DeviceModel>(), Ok(model));
        }
        assert_eq!(" UW_MK1 ".parse::<DeviceModel>(), Ok(DeviceModel::UwMk1));
        assert!("mk3".parse::<DeviceModel>().is_err());
    }

    #[test]
    fn test_os_version_quirk() {
        assert!(OsVersion::from("1.63").is_163());
        assert!(OsVersion::from(" 1.63 ").is_163());
        assert!(!OsVersion::from("1.62").is_163());
        assert!(!OsVersion::default().is_163());
    }
}
