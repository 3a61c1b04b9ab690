//! Distribution boards and their circuits

use crate::confidence::Confidence;
use crate::tracked::Tracked;
use serde::{Deserialize, Serialize};

/// A panel distributing protected circuits from one incoming supply
///
/// Board names are unique within a building block, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct DistributionBoard {
    /// Board designation, e.g. "DB-GF"
    pub name: String,

    /// Item-level provenance used by the confidence scorer
    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub description: Tracked<String>,
    #[serde(default)]
    pub location: Tracked<String>,

    /// Upstream board or supply point feeding this board
    #[serde(default)]
    pub supply_from: Tracked<String>,
    #[serde(default)]
    pub supply_cable: Tracked<String>,
    #[serde(default)]
    pub supply_cable_size_mm2: Tracked<f64>,
    #[serde(default)]
    pub supply_cable_length_m: Tracked<f64>,

    #[serde(default)]
    pub main_breaker_a: Tracked<u32>,
    #[serde(default)]
    pub main_breaker_type: Tracked<String>,

    /// Earth-leakage (ELCB/RCD) device present
    #[serde(default)]
    pub earth_leakage: Tracked<bool>,
    #[serde(default)]
    pub earth_leakage_rating_a: Tracked<u32>,
    #[serde(default)]
    pub surge_protection: Tracked<bool>,

    /// Unused breaker positions
    #[serde(default)]
    pub spare_ways: Tracked<u32>,

    #[serde(default)]
    pub phase: Tracked<String>,
    #[serde(default)]
    pub voltage_v: Tracked<u32>,
    #[serde(default)]
    pub fault_level_ka: Tracked<f64>,

    /// Circuits in schedule order
    #[serde(default)]
    pub circuits: Vec<Circuit>,
}

impl DistributionBoard {
    /// Create an empty board
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Circuit by identifier (case-insensitive)
    pub fn circuit(&self, id: &str) -> Option<&Circuit> {
        self.circuits.iter().find(|c| c.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Mutable circuit by identifier (case-insensitive)
    pub fn circuit_mut(&mut self, id: &str) -> Option<&mut Circuit> {
        self.circuits
            .iter_mut()
            .find(|c| c.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Circuits that are not spare
    pub fn active_circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.iter().filter(|c| !c.is_spare())
    }

    /// Scheduled circuits plus spare ways
    pub fn total_ways(&self) -> u32 {
        u32::try_from(self.circuits.len())
            .unwrap_or(u32::MAX)
            .saturating_add(self.spare_ways.value)
    }

    /// Sum of declared points over active circuits
    pub fn total_points(&self) -> u32 {
        self.active_circuits()
            .map(|c| c.num_points.value)
            .fold(0, u32::saturating_add)
    }
}

/// One protected branch within a board
///
/// Circuit identifiers are unique within their board.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Circuit {
    /// Schedule identifier, e.g. "L1" or "P3"
    pub id: String,

    /// Item-level provenance used by the confidence scorer
    #[serde(default)]
    pub confidence: Confidence,

    /// Type tag: lighting, power, air_con, pump, isolator, spare, ...
    #[serde(rename = "type", default)]
    pub circuit_type: Tracked<String>,
    #[serde(default)]
    pub description: Tracked<String>,

    #[serde(default)]
    pub wattage_w: Tracked<f64>,
    #[serde(default)]
    pub wattage_formula: Tracked<String>,

    #[serde(default)]
    pub cable_size_mm2: Tracked<f64>,
    #[serde(default)]
    pub cable_cores: Tracked<u32>,
    #[serde(default)]
    pub cable_type: Tracked<String>,

    #[serde(default)]
    pub breaker_a: Tracked<u32>,
    #[serde(default)]
    pub breaker_poles: Tracked<u32>,

    /// Declared number of points on the schedule
    #[serde(default)]
    pub num_points: Tracked<u32>,

    #[serde(default)]
    pub is_spare: Tracked<bool>,
    #[serde(default)]
    pub has_vsd: Tracked<bool>,
    #[serde(default)]
    pub has_isolator: Tracked<bool>,
    #[serde(default)]
    pub isolator_rating_a: Tracked<u32>,
    #[serde(default)]
    pub has_overload_relay: Tracked<bool>,

    /// Sub-board fed by this circuit, if any
    #[serde(default)]
    pub feeds_board: Tracked<String>,

    /// Circuits switched by this one (contactors, timers); accumulated, never overwritten
    #[serde(default)]
    pub controlled_circuits: Vec<String>,
}

impl Circuit {
    /// Create an empty circuit
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Spare by flag or by type tag
    pub fn is_spare(&self) -> bool {
        self.is_spare.value || self.circuit_type.value.trim().eq_ignore_ascii_case("spare")
    }

    /// Lower-cased type tag
    pub fn kind(&self) -> String {
        self.circuit_type.value.trim().to_lowercase()
    }

    /// Whether the type tag or description mentions a load name
    pub fn references_load(&self, load: &str) -> bool {
        let load = load.to_lowercase();
        self.kind().contains(&load) || self.description.value.to_lowercase().contains(&load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(circuits: &[(&str, &str, u32)], spare_ways: u32) -> DistributionBoard {
        let mut board = DistributionBoard::new("DB-GF");
        board.spare_ways = Tracked::new(spare_ways, Confidence::Extracted);
        for (id, kind, points) in circuits {
            let mut circuit = Circuit::new(*id);
            circuit.circuit_type = Tracked::new(kind.to_string(), Confidence::Extracted);
            circuit.num_points = Tracked::new(*points, Confidence::Extracted);
            board.circuits.push(circuit);
        }
        board
    }

    #[test]
    fn test_spare_by_type_or_flag() {
        let board = board_with(&[("L1", "lighting", 6), ("S1", "Spare", 0)], 2);
        assert!(!board.circuits[0].is_spare());
        assert!(board.circuits[1].is_spare());

        let mut flagged = Circuit::new("P9");
        flagged.is_spare = Tracked::new(true, Confidence::Extracted);
        assert!(flagged.is_spare());
    }

    #[test]
    fn test_ways_and_points() {
        let board = board_with(&[("L1", "lighting", 6), ("P1", "power", 4), ("S1", "spare", 3)], 2);
        assert_eq!(board.total_ways(), 5);
        assert_eq!(board.active_circuits().count(), 2);
        assert_eq!(board.total_points(), 10);
    }

    #[test]
    fn test_circuit_lookup_is_case_insensitive() {
        let mut board = board_with(&[("L1", "lighting", 6)], 0);
        assert!(board.circuit("l1").is_some());
        assert!(board.circuit_mut(" L1 ").is_some());
        assert!(board.circuit("L2").is_none());
    }

    #[test]
    fn test_references_load() {
        let mut circuit = Circuit::new("P4");
        circuit.circuit_type = Tracked::new("power".to_string(), Confidence::Extracted);
        circuit.description = Tracked::new("Kitchen Stove 32A".to_string(), Confidence::Extracted);
        assert!(circuit.references_load("stove"));
        assert!(!circuit.references_load("geyser"));
    }

    #[test]
    fn test_type_serialized_as_type() {
        let circuit = Circuit::new("L1");
        let json = serde_json::to_value(&circuit).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("circuit_type").is_none());
    }
}
