//! Flat site-level records: heavy equipment, cable runs, supply points, system parameters

use crate::confidence::Confidence;
use crate::tracked::Tracked;
use serde::{Deserialize, Serialize};

/// Large fixed load fed from a board (pumps, motors, chillers)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct HeavyEquipment {
    pub name: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(rename = "type", default)]
    pub equipment_type: Tracked<String>,
    #[serde(default)]
    pub rating_kw: Tracked<f64>,
    #[serde(default)]
    pub cable_size_mm2: Tracked<f64>,
    #[serde(default)]
    pub cable_type: Tracked<String>,
    #[serde(default)]
    pub breaker_a: Tracked<u32>,
    #[serde(default)]
    pub has_vsd: Tracked<bool>,
    #[serde(default)]
    pub has_dol: Tracked<bool>,
    #[serde(default)]
    pub isolator_a: Tracked<u32>,
    #[serde(default)]
    pub fed_from_db: Tracked<String>,
    #[serde(default)]
    pub qty: Tracked<u32>,
}

impl HeavyEquipment {
    /// Create an empty equipment record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Cable run between two points on the site plan
///
/// Runs are identified by their endpoints, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SiteCableRun {
    pub from_point: String,
    pub to_point: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub cable_spec: Tracked<String>,
    #[serde(default)]
    pub cable_size_mm2: Tracked<f64>,
    #[serde(default)]
    pub cable_cores: Tracked<u32>,
    #[serde(default)]
    pub cable_type: Tracked<String>,
    /// Run length; its confidence records whether it was dimensioned or scaled
    #[serde(default)]
    pub length_m: Tracked<f64>,
    #[serde(default)]
    pub is_underground: Tracked<bool>,
    #[serde(default)]
    pub needs_trenching: Tracked<bool>,
    #[serde(default)]
    pub notes: Tracked<String>,
}

impl SiteCableRun {
    /// Create an empty run between two points
    pub fn new(from_point: impl Into<String>, to_point: impl Into<String>) -> Self {
        Self {
            from_point: from_point.into(),
            to_point: to_point.into(),
            ..Default::default()
        }
    }

    /// Whether this run connects the given endpoints (in the given direction)
    pub fn connects(&self, from_point: &str, to_point: &str) -> bool {
        crate::project::names_match(&self.from_point, from_point)
            && crate::project::names_match(&self.to_point, to_point)
    }

    /// "<from> to <to>" label
    pub fn label(&self) -> String {
        format!("{} to {}", self.from_point, self.to_point)
    }
}

/// Utility or generator supply into the site
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SupplyPoint {
    pub name: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(rename = "type", default)]
    pub supply_type: Tracked<String>,
    #[serde(default)]
    pub voltage_v: Tracked<u32>,
    #[serde(default)]
    pub capacity_kva: Tracked<f64>,
    #[serde(default)]
    pub phase: Tracked<String>,
    #[serde(default)]
    pub location: Tracked<String>,
}

impl SupplyPoint {
    /// Create an empty supply point
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Installation-wide electrical parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SystemParameters {
    #[serde(default)]
    pub supply_voltage_v: Tracked<u32>,
    #[serde(default)]
    pub phase: Tracked<String>,
    #[serde(default)]
    pub frequency_hz: Tracked<u32>,
    #[serde(default)]
    pub earthing_system: Tracked<String>,
    #[serde(default)]
    pub fault_level_ka: Tracked<f64>,
}
