//! Regions
//!
//! Region names are normalized to the backend's lowercase, space-free form,
//! so `"West US"`, `"westus"` and `"WestUS"` are the same region.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Display labels for the well-known regions, keyed by normalized name
const REGION_LABELS: &[(&str, &str)] = &[
    ("eastus", "East US"),
    ("eastus2", "East US 2"),
    ("centralus", "Central US"),
    ("northcentralus", "North Central US"),
    ("southcentralus", "South Central US"),
    ("westcentralus", "West Central US"),
    ("westus", "West US"),
    ("westus2", "West US 2"),
    ("westus3", "West US 3"),
    ("canadacentral", "Canada Central"),
    ("brazilsouth", "Brazil South"),
    ("northeurope", "North Europe"),
    ("westeurope", "West Europe"),
    ("uksouth", "UK South"),
    ("francecentral", "France Central"),
    ("germanywestcentral", "Germany West Central"),
    ("swedencentral", "Sweden Central"),
    ("eastasia", "East Asia"),
    ("southeastasia", "Southeast Asia"),
    ("japaneast", "Japan East"),
    ("australiaeast", "Australia East"),
    ("centralindia", "Central India"),
];

/// A deployment region
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Region(Cow<'static, str>);

impl Region {
    pub const US_EAST: Region = Region(Cow::Borrowed("eastus"));
    pub const US_EAST2: Region = Region(Cow::Borrowed("eastus2"));
    pub const US_CENTRAL: Region = Region(Cow::Borrowed("centralus"));
    pub const US_WEST: Region = Region(Cow::Borrowed("westus"));
    pub const US_WEST2: Region = Region(Cow::Borrowed("westus2"));
    pub const US_WEST3: Region = Region(Cow::Borrowed("westus3"));
    pub const EUROPE_NORTH: Region = Region(Cow::Borrowed("northeurope"));
    pub const EUROPE_WEST: Region = Region(Cow::Borrowed("westeurope"));
    pub const UK_SOUTH: Region = Region(Cow::Borrowed("uksouth"));
    pub const ASIA_EAST: Region = Region(Cow::Borrowed("eastasia"));
    pub const ASIA_SOUTHEAST: Region = Region(Cow::Borrowed("southeastasia"));
    pub const JAPAN_EAST: Region = Region(Cow::Borrowed("japaneast"));
    pub const AUSTRALIA_EAST: Region = Region(Cow::Borrowed("australiaeast"));

    /// Build a region from a name or a display label
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match REGION_LABELS.iter().find(|(key, _)| *key == normalized) {
            Some((key, _)) => Region(Cow::Borrowed(*key)),
            None => Region(Cow::Owned(normalized)),
        }
    }

    /// Normalized name as used on the wire
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Human-readable label; unknown regions echo their name
    pub fn label(&self) -> &str {
        REGION_LABELS
            .iter()
            .find(|(key, _)| *key == self.name())
            .map(|(_, label)| *label)
            .unwrap_or_else(|| self.name())
    }

    /// Label with spaces removed, the form used to qualify service tags
    /// (`West US` -> `WestUS`)
    pub fn qualifier(&self) -> String {
        self.label().chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// All regions with a known label
    pub fn known() -> impl Iterator<Item = Region> {
        REGION_LABELS.iter().map(|(key, _)| Region(Cow::Borrowed(*key)))
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Region::from_name(&raw))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Region::from_name(value)
    }
}
