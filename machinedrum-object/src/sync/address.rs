use super::tracker::SlotStatus;
use crate::error::SlotAddressError;
use crate::types::SlotDomain;
use std::collections::HashMap;
use std::str::FromStr;

/// Where a UI slot id points, e.g. `kit:3` is the fourth kit slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotAddress {
    pub domain: SlotDomain,
    pub index: usize,
}

impl SlotAddress {
    pub const fn new(domain: SlotDomain, index: usize) -> Self {
        Self { domain, index }
    }

    /// The UI slot id of this address.
    pub fn ui_slot_id(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.domain, self.index)
    }
}

impl FromStr for SlotAddress {
    type Err = SlotAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, index) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| SlotAddressError::InvalidFormat(s.to_owned()))?;
        let domain = domain.parse::<SlotDomain>()?;
        let index = index
            .parse::<usize>()
            .map_err(|_| SlotAddressError::InvalidIndex(index.to_owned()))?;
        Ok(Self { domain, index })
    }
}

/// Whatever currently renders a slot.
pub trait PresentationTarget {
    fn apply_status(&mut self, status: SlotStatus);
}

/// Turns UI slot ids into presentation targets.
pub trait SlotAddressing {
    /// Reads a UI slot id, `None` when it is malformed.
    fn resolve(&self, ui_slot_id: &str) -> Option<SlotAddress> {
        ui_slot_id.parse().ok()
    }

    /// The target rendering `address`, `None` when the slot is not on screen.
    fn target(&mut self, address: &SlotAddress) -> Option<&mut dyn PresentationTarget>;
}

/// Last status applied to a rendered slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    pub status: SlotStatus,
    pub applied: usize,
}

impl PresentationTarget for Indicator {
    fn apply_status(&mut self, status: SlotStatus) {
        self.status = status;
        self.applied += 1;
    }
}

/// Presentation layer without a screen, keeping the indicator of every rendered slot.
///
/// Rendering a slot again replaces its indicator with a blank one, like a regenerated
/// slot list does.
#[derive(Debug, Default)]
pub struct HeadlessIndicators {
    rendered: HashMap<SlotAddress, Indicator>,
}

impl HeadlessIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, address: SlotAddress) {
        self.rendered.insert(address, Indicator::default());
    }

    /// Renders every slot of `domain` up to `count`.
    pub fn render_domain(&mut self, domain: SlotDomain, count: usize) {
        (0..count).for_each(|index| self.render(SlotAddress::new(domain, index)));
    }

    pub fn unrender(&mut self, address: &SlotAddress) {
        self.rendered.remove(address);
    }

    pub fn shown(&self, address: &SlotAddress) -> Option<SlotStatus> {
        self.rendered.get(address).map(|indicator| indicator.status)
    }

    pub fn indicator(&self, address: &SlotAddress) -> Option<&Indicator> {
        self.rendered.get(address)
    }
}

impl SlotAddressing for HeadlessIndicators {
    fn target(&mut self, address: &SlotAddress) -> Option<&mut dyn PresentationTarget> {
        self.rendered
            .get_mut(address)
            .map(|indicator| indicator as &mut dyn PresentationTarget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_address_parsing() {
        assert_eq!(
            "kit:3".parse::<SlotAddress>(),
            Ok(SlotAddress::new(SlotDomain::Kit, 3))
        );
        assert_eq!(
            " pattern:127 ".parse::<SlotAddress>(),
            Ok(SlotAddress::new(SlotDomain::Pattern, 127))
        );
        assert_eq!(SlotAddress::new(SlotDomain::Song, 2).ui_slot_id(), "song:2");
    }

    #[test]
    fn test_malformed_slot_ids() {
        assert_eq!(
            "kit3".parse::<SlotAddress>(),
            Err(SlotAddressError::InvalidFormat("kit3".to_owned()))
        );
        assert_eq!(
            "sound:1".parse::<SlotAddress>(),
            Err(SlotAddressError::InvalidDomain("sound".to_owned()))
        );
        assert_eq!(
            "kit:-1".parse::<SlotAddress>(),
            Err(SlotAddressError::InvalidIndex("-1".to_owned()))
        );
        assert_eq!(HeadlessIndicators::new().resolve("kit:x"), None);
    }

    #[test]
    fn test_headless_targets_only_rendered_slots() {
        let mut indicators = HeadlessIndicators::new();
        let kit = SlotAddress::new(SlotDomain::Kit, 1);
        assert!(indicators.target(&kit).is_none());
        indicators.render(kit);
        let status = SlotStatus {
            dirty: true,
            ..SlotStatus::default()
        };
        indicators
            .target(&kit)
            .expect("rendered")
            .apply_status(status);
        assert_eq!(indicators.shown(&kit), Some(status));
        indicators.render(kit);
        assert_eq!(indicators.shown(&kit), Some(SlotStatus::default()));
    }
}
