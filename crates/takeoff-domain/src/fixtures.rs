//! Fixture counts - per-room tallies of drawing symbols

use crate::confidence::Confidence;
use crate::tracked::Tracked;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lighting symbol keys
pub const LIGHT_KEYS: &[&str] = &[
    "recessed_led_600x1200",
    "surface_mount_led_18w",
    "flood_light_30w",
    "flood_light_200w",
    "downlight_led_6w",
    "vapor_proof_2x24w",
    "vapor_proof_2x18w",
    "prismatic_2x18w",
    "bulkhead_26w",
    "bulkhead_24w",
    "fluorescent_50w_5ft",
    "pole_light_60w",
    "pool_flood_light",
    "pool_underwater_light",
];

/// Socket outlet symbol keys
pub const SOCKET_KEYS: &[&str] = &[
    "double_socket_300",
    "single_socket_300",
    "double_socket_1100",
    "single_socket_1100",
    "double_socket_waterproof",
    "double_socket_ceiling",
    "floor_box",
];

/// Switch and isolator symbol keys
pub const SWITCH_KEYS: &[&str] = &[
    "switch_1lever_1way",
    "switch_2lever_1way",
    "switch_1lever_2way",
    "day_night_switch",
    "isolator_30a",
    "isolator_20a",
    "master_switch",
];

/// Fixed-load equipment keys
pub const EQUIPMENT_KEYS: &[&str] = &[
    "ac_units",
    "geyser_50l",
    "geyser_100l",
    "geyser_150l",
    "geyser_200l",
];

/// Key used for air-conditioning unit counts
pub const AC_UNITS_KEY: &str = "ac_units";

/// Key used for waterproof sockets
pub const WATERPROOF_SOCKET_KEY: &str = "double_socket_waterproof";

/// Which total a fixture key contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureCategory {
    /// Luminaires
    Lighting,
    /// Socket outlets
    Power,
    /// Switches and isolators
    Switch,
    /// Fixed appliances (AC units, geysers)
    Equipment,
    /// Counted in no total (data points and anything unrecognised)
    Other,
}

impl FixtureCategory {
    /// Classify a fixture key
    ///
    /// Catalogue keys are matched exactly; anything else falls back to a keyword
    /// match (`wall_light_led` counts as lighting).
    pub fn of(key: &str) -> Self {
        let key = key.trim().to_lowercase();
        let key = key.as_str();

        if LIGHT_KEYS.contains(&key) {
            return FixtureCategory::Lighting;
        }
        if SOCKET_KEYS.contains(&key) {
            return FixtureCategory::Power;
        }
        if SWITCH_KEYS.contains(&key) {
            return FixtureCategory::Switch;
        }
        if EQUIPMENT_KEYS.contains(&key) {
            return FixtureCategory::Equipment;
        }
        if key.contains("data") {
            return FixtureCategory::Other;
        }
        if ["light", "lamp", "flood", "bulkhead", "luminaire"]
            .iter()
            .any(|word| key.contains(word))
        {
            return FixtureCategory::Lighting;
        }
        if key.contains("socket") || key.contains("plug") {
            return FixtureCategory::Power;
        }
        if key.contains("switch") || key.contains("isolator") {
            return FixtureCategory::Switch;
        }
        if key.contains("geyser") || key.starts_with("ac_") {
            return FixtureCategory::Equipment;
        }
        FixtureCategory::Other
    }

    /// Catalogue keys belonging to this category
    pub fn catalogue(&self) -> &'static [&'static str] {
        match self {
            FixtureCategory::Lighting => LIGHT_KEYS,
            FixtureCategory::Power => SOCKET_KEYS,
            FixtureCategory::Switch => SWITCH_KEYS,
            FixtureCategory::Equipment => EQUIPMENT_KEYS,
            FixtureCategory::Other => &[],
        }
    }
}

/// Flat mapping of fixture key to a confidence-tagged count
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureCounts(BTreeMap<String, Tracked<u32>>);

impl FixtureCounts {
    /// Create an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a key (0 when absent)
    pub fn get(&self, key: &str) -> u32 {
        self.0.get(key).map(|t| t.value).unwrap_or(0)
    }

    /// Tracked entry for a key
    pub fn entry(&self, key: &str) -> Option<&Tracked<u32>> {
        self.0.get(key)
    }

    /// Truthy-overwrite merge of one count
    pub fn absorb(&mut self, key: &str, count: Option<u32>, confidence: Confidence) -> bool {
        self.0
            .entry(normalize_key(key))
            .or_default()
            .absorb(count, confidence)
    }

    /// Verification overwrite of one count
    pub fn replace(&mut self, key: &str, count: Option<u32>, confidence: Confidence) -> bool {
        if count.is_none() {
            return false;
        }
        self.0
            .entry(normalize_key(key))
            .or_default()
            .replace(count, confidence)
    }

    /// Pin a reviewer-supplied count
    pub fn set_manual(&mut self, key: &str, count: u32) {
        self.0
            .entry(normalize_key(key))
            .or_default()
            .set_manual(count);
    }

    /// Iterate over keys and tracked counts in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tracked<u32>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether no non-zero count is recorded
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|t| t.value == 0)
    }

    /// Sum of counts in a category
    pub fn total(&self, category: FixtureCategory) -> u32 {
        self.0
            .iter()
            .filter(|(key, _)| FixtureCategory::of(key) == category)
            .map(|(_, t)| t.value)
            .fold(0, u32::saturating_add)
    }

    /// Total luminaires
    pub fn total_lights(&self) -> u32 {
        self.total(FixtureCategory::Lighting)
    }

    /// Total socket outlets
    pub fn total_sockets(&self) -> u32 {
        self.total(FixtureCategory::Power)
    }

    /// Total switches and isolators
    pub fn total_switches(&self) -> u32 {
        self.total(FixtureCategory::Switch)
    }

    /// Lights plus sockets
    pub fn total_points(&self) -> u32 {
        self.total_lights().saturating_add(self.total_sockets())
    }

    /// Number of keys with a non-zero count
    pub fn nonzero_entries(&self) -> usize {
        self.0.values().filter(|t| t.value > 0).count()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
