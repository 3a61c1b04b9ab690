//! Cross-reference between schedule point counts and layout fixture counts
//!
//! A circuit's declared points come from the board schedule. The observed
//! count is read off the layouts: every room in the same block that lists
//! the circuit contributes its lighting total when the circuit id contains
//! `L`, or its socket total when it contains `P`. `L` is checked first on the
//! upper-cased id; an id with neither letter observes 0.

use crate::error::ComplianceError;
use serde::{Deserialize, Serialize};
use takeoff_domain::{BuildingBlock, Circuit, DistributionBoard, Project, Room};
use tracing::info;

/// How large a point-count mismatch is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancySeverity {
    /// Off by one
    Low,
    /// Off by two or three
    Medium,
    /// Off by more than three
    High,
}

impl DiscrepancySeverity {
    /// Classify an absolute difference
    pub fn from_diff(diff: u32) -> Self {
        if diff > 3 {
            DiscrepancySeverity::High
        } else if diff > 1 {
            DiscrepancySeverity::Medium
        } else {
            DiscrepancySeverity::Low
        }
    }

    /// Get the severity as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancySeverity::Low => "low",
            DiscrepancySeverity::Medium => "medium",
            DiscrepancySeverity::High => "high",
        }
    }
}

impl std::fmt::Display for DiscrepancySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schedule and layout disagree on a circuit's points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Circuit id
    pub circuit: String,
    /// Board name
    pub board: String,
    /// Block name
    pub block: String,
    /// Points on the schedule
    pub declared: u32,
    /// Points counted on the layouts
    pub observed: u32,
    /// Absolute difference
    pub diff: u32,
    /// Size of the mismatch
    pub severity: DiscrepancySeverity,
}

/// Outcome of linking one circuit to the layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Declared equals observed and is non-zero
    Matched,
    /// Declared and observed differ
    Conflict,
    /// No room references the circuit
    Unlinked,
    /// Nothing declared but points observed
    Undeclared,
    /// Rooms reference the circuit but neither side has points
    Empty,
}

impl LinkStatus {
    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Matched => "matched",
            LinkStatus::Conflict => "conflict",
            LinkStatus::Unlinked => "unlinked",
            LinkStatus::Undeclared => "undeclared",
            LinkStatus::Empty => "empty",
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One non-spare circuit and the rooms it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitLink {
    /// Block name
    pub block: String,
    /// Board name
    pub board: String,
    /// Circuit id
    pub circuit: String,
    /// Rooms whose references name this circuit
    pub rooms_served: Vec<String>,
    /// Points on the schedule
    pub declared: u32,
    /// Points counted on the layouts
    pub observed: u32,
    /// Absolute difference
    pub diff: u32,
    /// Link outcome
    pub status: LinkStatus,
}

/// Every link plus the discrepancies among them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceReport {
    /// Mismatches, in board then circuit order
    pub discrepancies: Vec<Discrepancy>,
    /// One entry per non-spare circuit
    pub links: Vec<CircuitLink>,
    /// Links with status `matched`
    pub matched: usize,
    /// Links with status `conflict`
    pub conflicts: usize,
}

impl CrossReferenceReport {
    /// Discrepancies at the given severity
    pub fn at_severity(&self, severity: DiscrepancySeverity) -> impl Iterator<Item = &Discrepancy> {
        self.discrepancies.iter().filter(move |d| d.severity == severity)
    }

    /// Links no room references
    pub fn unlinked(&self) -> impl Iterator<Item = &CircuitLink> {
        self.links.iter().filter(|l| l.status == LinkStatus::Unlinked)
    }

    /// Serialize the report as pretty JSON
    pub fn to_json(&self) -> Result<String, ComplianceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fixture total a room contributes to a circuit
fn room_points(room: &Room, circuit_id: &str) -> u32 {
    let id = circuit_id.to_uppercase();
    if id.contains('L') {
        room.fixtures.total_lights()
    } else if id.contains('P') {
        room.fixtures.total_sockets()
    } else {
        0
    }
}

fn link_circuit(block: &BuildingBlock, board: &DistributionBoard, circuit: &Circuit) -> CircuitLink {
    let served: Vec<&Room> = block
        .rooms
        .iter()
        .filter(|room| room.references_circuit(&board.name, &circuit.id))
        .collect();

    let declared = circuit.num_points.value;
    let observed = served
        .iter()
        .map(|room| room_points(room, &circuit.id))
        .fold(0, u32::saturating_add);
    let diff = declared.abs_diff(observed);

    let status = if served.is_empty() {
        LinkStatus::Unlinked
    } else if declared == observed {
        if declared == 0 {
            LinkStatus::Empty
        } else {
            LinkStatus::Matched
        }
    } else if declared == 0 {
        LinkStatus::Undeclared
    } else {
        LinkStatus::Conflict
    };

    CircuitLink {
        block: block.name.clone(),
        board: board.name.clone(),
        circuit: circuit.id.clone(),
        rooms_served: served.iter().map(|room| room.name.clone()).collect(),
        declared,
        observed,
        diff,
        status,
    }
}

/// Link every non-spare circuit to the rooms that reference it
pub fn cross_reference(project: &Project) -> CrossReferenceReport {
    let mut report = CrossReferenceReport::default();

    for (block, board) in project.boards() {
        for circuit in board.active_circuits() {
            let link = link_circuit(block, board, circuit);
            match link.status {
                LinkStatus::Matched => report.matched += 1,
                LinkStatus::Conflict => {
                    report.conflicts += 1;
                    report.discrepancies.push(Discrepancy {
                        circuit: link.circuit.clone(),
                        board: link.board.clone(),
                        block: link.block.clone(),
                        declared: link.declared,
                        observed: link.observed,
                        diff: link.diff,
                        severity: DiscrepancySeverity::from_diff(link.diff),
                    });
                }
                _ => {}
            }
            report.links.push(link);
        }
    }

    info!(
        project = %project.name,
        circuits = report.links.len(),
        matched = report.matched,
        conflicts = report.conflicts,
        "Cross-reference complete"
    );
    report
}
