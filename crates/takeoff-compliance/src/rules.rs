//! Compliance rules
//!
//! Each rule is a stateless unit struct that reads the settled graph and
//! returns zero or more flags. Rules never mutate the project.

use crate::config::ComplianceConfig;
use crate::report::{Flag, Severity};
use takeoff_domain::fixtures::AC_UNITS_KEY;
use takeoff_domain::{BuildingBlock, Confidence, Project, Truthy};

/// Conductor current capacity in amps, enclosed in conduit
pub const CABLE_CURRENT_CAPACITY: &[(f64, f64)] = &[
    (1.5, 14.5),
    (2.5, 19.5),
    (4.0, 26.0),
    (6.0, 34.0),
    (10.0, 46.0),
    (16.0, 61.0),
    (25.0, 80.0),
    (35.0, 99.0),
    (50.0, 119.0),
    (70.0, 151.0),
    (95.0, 182.0),
];

/// Largest breaker in amps per conductor size
pub const CABLE_MAX_BREAKER: &[(f64, u32)] = &[
    (1.5, 16),
    (2.5, 20),
    (4.0, 25),
    (6.0, 32),
    (10.0, 40),
    (16.0, 63),
    (25.0, 80),
    (35.0, 100),
];

/// Room types where only one general socket is expected
const BATHROOM_TYPES: &[&str] = &["bathroom", "toilet", "shower"];

/// A deterministic check over the entity graph
pub trait Rule: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Whether the configuration enables this rule
    fn enabled(&self, config: &ComplianceConfig) -> bool;

    /// Evaluate the rule
    fn evaluate(&self, project: &Project, config: &ComplianceConfig) -> Vec<Flag>;
}

fn lookup<T: Copy>(table: &[(f64, T)], size: f64) -> Option<T> {
    table
        .iter()
        .find(|(s, _)| (s - size).abs() < 1e-6)
        .map(|(_, v)| *v)
}

/// Suggested way count after upsizing a board by a fifth
fn upsized_ways(total_ways: u32) -> u32 {
    let upsized = (u64::from(total_ways) * 6).div_ceil(5);
    u32::try_from(upsized).unwrap_or(u32::MAX)
}

/// Every board must have earth-leakage protection
pub struct EarthLeakageRule;

impl Rule for EarthLeakageRule {
    fn name(&self) -> &'static str {
        "earth_leakage"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_earth_leakage
    }

    fn evaluate(&self, project: &Project, config: &ComplianceConfig) -> Vec<Flag> {
        project
            .boards()
            .map(|(block, board)| {
                let flag = if board.earth_leakage.value {
                    Flag::pass(
                        "ELCB_REQUIRED",
                        Severity::Critical,
                        format!("{}: Earth leakage protection present", board.name),
                    )
                } else {
                    Flag::fail(
                        "ELCB_REQUIRED",
                        Severity::Critical,
                        format!("{}: No earth leakage protection detected", board.name),
                    )
                    .corrected(format!(
                        "Add {}A {}mA ELCB",
                        config.elcb_rating_a, config.elcb_sensitivity_ma
                    ))
                    .standard("SANS 10142-1 clause 6.7")
                };
                flag.in_block(&block.name).on_board(&board.name)
            })
            .collect()
    }
}

/// Surge protection is recommended on every board
pub struct SurgeProtectionRule;

impl Rule for SurgeProtectionRule {
    fn name(&self) -> &'static str {
        "surge_protection"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_surge_protection
    }

    fn evaluate(&self, project: &Project, _config: &ComplianceConfig) -> Vec<Flag> {
        project
            .boards()
            .filter(|(_, board)| !board.surge_protection.value)
            .map(|(block, board)| {
                Flag::fail(
                    "SURGE_PROTECTION",
                    Severity::Warning,
                    format!("{}: No surge protection device", board.name),
                )
                .corrected("Add Type 2 SPD")
                .standard("SANS 10142-1 clause 6.3.4")
                .in_block(&block.name)
                .on_board(&board.name)
            })
            .collect()
    }
}

/// Lighting and power circuits are capped in points
pub struct CircuitPointsRule;

impl Rule for CircuitPointsRule {
    fn name(&self) -> &'static str {
        "circuit_points"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_circuit_points
    }

    fn evaluate(&self, project: &Project, config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for (block, board) in project.boards() {
            for circuit in board.active_circuits() {
                let (rule, noun, max, clause) = match circuit.kind().as_str() {
                    "lighting" => (
                        "MAX_LIGHTS_PER_CIRCUIT",
                        "lights",
                        config.max_lighting_points,
                        "SANS 10142-1 clause 6.14.1",
                    ),
                    "power" => (
                        "MAX_SOCKETS_PER_CIRCUIT",
                        "sockets",
                        config.max_socket_points,
                        "SANS 10142-1 clause 6.15.1",
                    ),
                    _ => continue,
                };
                let points = circuit.num_points.value;
                if points <= max {
                    continue;
                }
                flags.push(
                    Flag::fail(
                        rule,
                        Severity::Critical,
                        format!(
                            "{} {}: {} {} exceeds max {}",
                            board.name, circuit.id, points, noun, max
                        ),
                    )
                    .corrected(format!("Split into {} circuits", (points / max).saturating_add(1)))
                    .standard(clause)
                    .in_block(&block.name)
                    .on_board(&board.name)
                    .on_circuit(&circuit.id),
                );
            }
        }
        flags
    }
}

/// Boards keep a minimum share of spare ways
pub struct SpareWaysRule;

impl Rule for SpareWaysRule {
    fn name(&self) -> &'static str {
        "spare_ways"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_spare_ways
    }

    fn evaluate(&self, project: &Project, config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for (block, board) in project.boards() {
            let total_ways = board.total_ways();
            if total_ways == 0 {
                continue;
            }
            let spare_pct = board.spare_ways.value as f64 / total_ways as f64 * 100.0;
            if spare_pct >= config.min_spare_ways_pct {
                continue;
            }
            flags.push(
                Flag::fail(
                    "MIN_SPARE_WAYS",
                    Severity::Warning,
                    format!(
                        "{}: Only {:.0}% spare ways (min {}%)",
                        board.name, spare_pct, config.min_spare_ways_pct
                    ),
                )
                .corrected(format!("Upsize to {}-way DB", upsized_ways(total_ways)))
                .standard("SANS 10142-1 clause 6.6.2")
                .in_block(&block.name)
                .on_board(&board.name),
            );
        }
        flags
    }
}

/// Kitchens need a stove circuit and geysers need their own circuit
pub struct DedicatedCircuitRule;

impl DedicatedCircuitRule {
    fn check_block(block: &BuildingBlock, flags: &mut Vec<Flag>) {
        let has_stove = block.has_dedicated_circuit("stove");
        let has_geyser = block.has_dedicated_circuit("geyser");

        for room in &block.rooms {
            if room.kind() == "kitchen" && !has_stove {
                flags.push(
                    Flag::fail(
                        "DEDICATED_STOVE_CIRCUIT",
                        Severity::Critical,
                        format!("{}: Kitchen requires dedicated stove circuit", room.name),
                    )
                    .corrected("Add 32A dedicated stove circuit")
                    .standard("SANS 10142-1 clause 6.15.5")
                    .in_block(&block.name),
                );
            }
            if room.has_geyser.value && !has_geyser {
                flags.push(
                    Flag::fail(
                        "DEDICATED_GEYSER_CIRCUIT",
                        Severity::Critical,
                        format!("{}: Geyser requires dedicated circuit with timer", room.name),
                    )
                    .corrected("Add 20A dedicated geyser circuit with timer")
                    .standard("SANS 10142-1 clause 6.15.5")
                    .in_block(&block.name),
                );
            }
        }
    }
}

impl Rule for DedicatedCircuitRule {
    fn name(&self) -> &'static str {
        "dedicated_circuits"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_dedicated_circuits
    }

    fn evaluate(&self, project: &Project, _config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for block in &project.building_blocks {
            Self::check_block(block, &mut flags);
        }
        flags
    }
}

/// Breaker ratings must suit the conductor; minimum conductor sizes apply
pub struct CableSizingRule;

impl Rule for CableSizingRule {
    fn name(&self) -> &'static str {
        "cable_sizing"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_cable_sizing
    }

    fn evaluate(&self, project: &Project, _config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for (block, board) in project.boards() {
            for circuit in board.active_circuits() {
                let size = circuit.cable_size_mm2.value;
                let breaker = circuit.breaker_a.value;
                let locate = |flag: Flag| {
                    flag.in_block(&block.name)
                        .on_board(&board.name)
                        .on_circuit(&circuit.id)
                };

                if size.is_truthy() && breaker.is_truthy() {
                    let capacity = lookup(CABLE_CURRENT_CAPACITY, size);
                    let max_breaker = lookup(CABLE_MAX_BREAKER, size);

                    match (capacity, max_breaker) {
                        (Some(capacity), _) if breaker as f64 > capacity => flags.push(locate(
                            Flag::fail(
                                "CABLE_OVERCURRENT_PROTECTION",
                                Severity::Critical,
                                format!(
                                    "{} {}: {}A breaker exceeds {}mm² cable capacity ({}A)",
                                    board.name, circuit.id, breaker, size, capacity
                                ),
                            )
                            .corrected(format!("Upsize cable to handle {}A", breaker))
                            .standard("SANS 10142-1 clause 6.2.1"),
                        )),
                        (_, Some(max)) if breaker > max => flags.push(locate(
                            Flag::fail(
                                "CABLE_BREAKER_MISMATCH",
                                Severity::Warning,
                                format!(
                                    "{} {}: {}A breaker too large for {}mm² (max {}A)",
                                    board.name, circuit.id, breaker, size, max
                                ),
                            )
                            .standard("SANS 10142-1 clause 6.2.2"),
                        )),
                        _ => {}
                    }
                }

                let kind = circuit.kind();
                if kind == "lighting" && size.is_truthy() && size < 1.5 {
                    flags.push(locate(
                        Flag::fail(
                            "MIN_CABLE_SIZE_LIGHTING",
                            Severity::Critical,
                            format!(
                                "{} {}: Lighting circuit requires min 1.5mm² cable",
                                board.name, circuit.id
                            ),
                        )
                        .corrected("Use 1.5mm² cable minimum")
                        .standard("SANS 10142-1 clause 6.2.3"),
                    ));
                }
                if kind == "power" && size.is_truthy() && size < 2.5 {
                    flags.push(locate(
                        Flag::fail(
                            "MIN_CABLE_SIZE_POWER",
                            Severity::Critical,
                            format!(
                                "{} {}: Power circuit requires min 2.5mm² cable",
                                board.name, circuit.id
                            ),
                        )
                        .corrected("Use 2.5mm² cable minimum")
                        .standard("SANS 10142-1 clause 6.2.3"),
                    ));
                }
            }
        }
        flags
    }
}

/// Socket restrictions in wet areas
pub struct WetAreaRule;

impl Rule for WetAreaRule {
    fn name(&self) -> &'static str {
        "wet_areas"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_wet_areas
    }

    fn evaluate(&self, project: &Project, _config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for (block, room) in project.rooms() {
            if !room.is_wet() {
                continue;
            }
            let sockets = room.general_sockets();

            if BATHROOM_TYPES.contains(&room.kind().as_str()) && sockets > 1 {
                flags.push(
                    Flag::fail(
                        "WET_AREA_SOCKET_RESTRICTION",
                        Severity::Warning,
                        format!(
                            "{}: Bathroom has {} sockets - verify zone compliance",
                            room.name, sockets
                        ),
                    )
                    .standard("SANS 10142-1 clause 7.1.3")
                    .in_block(&block.name),
                );
            }
            if sockets > 0 && room.waterproof_sockets() == 0 {
                flags.push(
                    Flag::fail(
                        "WET_AREA_IP_RATING",
                        Severity::Warning,
                        format!("{}: Wet area sockets should be IP44 rated minimum", room.name),
                    )
                    .corrected("Use IP44 rated sockets")
                    .standard("SANS 10142-1 clause 7.1.2")
                    .in_block(&block.name),
                );
            }
        }
        flags
    }
}

/// Each AC unit needs its own circuit and an isolator
pub struct AirConditioningRule;

impl AirConditioningRule {
    fn check_block(block: &BuildingBlock, flags: &mut Vec<Flag>) {
        let units: u32 = block
            .rooms
            .iter()
            .map(|room| room.fixtures.get(AC_UNITS_KEY))
            .fold(0, u32::saturating_add);
        if units == 0 {
            return;
        }

        let ac_circuits: Vec<_> = block
            .distribution_boards
            .iter()
            .flat_map(|b| b.circuits.iter())
            .filter(|c| c.kind().contains("ac") || c.description.value.to_lowercase().contains("air"))
            .collect();
        let circuits = ac_circuits.len() as u32;
        let isolated = ac_circuits.iter().filter(|c| c.has_isolator.value).count() as u32;

        if circuits < units {
            flags.push(
                Flag::fail(
                    "AC_DEDICATED_CIRCUIT",
                    Severity::Critical,
                    format!(
                        "{}: {} AC units but only {} dedicated circuits",
                        block.name, units, circuits
                    ),
                )
                .corrected(format!("Add {} dedicated AC circuits", units - circuits))
                .standard("SANS 10142-1 clause 6.15.5")
                .in_block(&block.name),
            );
        }
        if isolated < units {
            flags.push(
                Flag::fail(
                    "AC_ISOLATOR_REQUIRED",
                    Severity::Warning,
                    format!(
                        "{}: AC units require isolator switches within sight of unit",
                        block.name
                    ),
                )
                .corrected(format!("Add {} AC isolator switches", units - isolated))
                .standard("SANS 10142-1 clause 6.16.2")
                .in_block(&block.name),
            );
        }
    }
}

impl Rule for AirConditioningRule {
    fn name(&self) -> &'static str {
        "air_conditioning"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_air_conditioning
    }

    fn evaluate(&self, project: &Project, _config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for block in &project.building_blocks {
            Self::check_block(block, &mut flags);
        }
        flags
    }
}

/// Estimated lengths and long thin runs on the site plan
pub struct SiteCableRule;

impl Rule for SiteCableRule {
    fn name(&self) -> &'static str {
        "site_cables"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_site_cables
    }

    fn evaluate(&self, project: &Project, config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for run in &project.site_cable_runs {
            let length = run.length_m.value;
            let size = run.cable_size_mm2.value;

            if length.is_truthy() && run.length_m.confidence == Confidence::Estimated {
                flags.push(
                    Flag::pass(
                        "CABLE_LENGTH_ESTIMATED",
                        Severity::Info,
                        format!("Cable {}: Length ({}m) is estimated", run.label(), length),
                    )
                    .standard("Site survey recommended"),
                );
            }
            if length > config.long_run_m && size < config.voltage_drop_min_mm2 {
                flags.push(
                    Flag::fail(
                        "VOLTAGE_DROP_WARNING",
                        Severity::Warning,
                        format!(
                            "Cable {}: {}m run with {}mm² may exceed voltage drop limits",
                            run.label(),
                            length,
                            size
                        ),
                    )
                    .advice("Verify voltage drop calculation")
                    .standard("SANS 10142-1 Annexure B"),
                );
            }
        }
        flags
    }
}

/// Underground cabling and external luminaires
pub struct ExternalInstallationRule;

impl Rule for ExternalInstallationRule {
    fn name(&self) -> &'static str {
        "external"
    }

    fn enabled(&self, config: &ComplianceConfig) -> bool {
        config.check_external
    }

    fn evaluate(&self, project: &Project, config: &ComplianceConfig) -> Vec<Flag> {
        let mut flags = Vec::new();
        for run in &project.site_cable_runs {
            if !(run.is_underground.value || run.needs_trenching.value) {
                continue;
            }
            let cable_type = run.cable_type.value.trim().to_uppercase();
            if !cable_type.is_empty()
                && !cable_type.contains("SWA")
                && !cable_type.contains("ARMOURED")
            {
                flags.push(
                    Flag::fail(
                        "UNDERGROUND_CABLE_TYPE",
                        Severity::Critical,
                        format!(
                            "Cable {}: Underground cables must be SWA (armoured)",
                            run.label()
                        ),
                    )
                    .corrected("Use PVC/SWA/PVC armoured cable")
                    .standard("SANS 10142-1 clause 7.3.1"),
                );
            }
            if run.length_m.value > config.burial_note_min_m {
                flags.push(
                    Flag::pass(
                        "UNDERGROUND_BURIAL_DEPTH",
                        Severity::Info,
                        format!("Cable {}: Verify minimum 600mm burial depth", run.label()),
                    )
                    .standard("SANS 10142-1 clause 7.3.2"),
                );
            }
        }

        let external = project
            .outside_lights
            .as_ref()
            .map(|lights| lights.total_lights())
            .unwrap_or(0);
        if external > 0 {
            flags.push(
                Flag::pass(
                    "EXTERNAL_IP_RATING",
                    Severity::Info,
                    format!(
                        "External lighting ({} fittings): Verify IP65 rating minimum",
                        external
                    ),
                )
                .standard("SANS 10142-1 clause 7.2.1"),
            );
        }
        flags
    }
}

/// The standard rule set, in evaluation order
pub fn standard_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(EarthLeakageRule),
        Box::new(SurgeProtectionRule),
        Box::new(CircuitPointsRule),
        Box::new(SpareWaysRule),
        Box::new(DedicatedCircuitRule),
        Box::new(CableSizingRule),
        Box::new(WetAreaRule),
        Box::new(AirConditioningRule),
        Box::new(SiteCableRule),
        Box::new(ExternalInstallationRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use takeoff_domain::{Circuit, DistributionBoard, Room, SiteCableRun, Tracked};

    fn tracked<T>(value: T) -> Tracked<T> {
        Tracked::new(value, Confidence::Extracted)
    }

    fn circuit(id: &str, kind: &str, points: u32) -> Circuit {
        let mut circuit = Circuit::new(id);
        circuit.circuit_type = tracked(kind.to_string());
        circuit.num_points = tracked(points);
        circuit
    }

    fn project_with_board(board: DistributionBoard) -> Project {
        let mut project = Project::with_blocks("test", ["Main House"]);
        project.building_blocks[0].distribution_boards.push(board);
        project
    }

    fn rule_names(flags: &[Flag]) -> Vec<&str> {
        flags.iter().map(|f| f.rule_name.as_str()).collect()
    }

    #[test]
    fn test_upsized_ways_rounds_up() {
        assert_eq!(upsized_ways(10), 12);
        assert_eq!(upsized_ways(12), 15);
        assert_eq!(upsized_ways(8), 10);
        assert_eq!(upsized_ways(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_elcb_pass_and_fail() {
        let mut with = DistributionBoard::new("DB-1");
        with.earth_leakage = tracked(true);
        let without = DistributionBoard::new("DB-2");
        let mut project = project_with_board(with);
        project.building_blocks[0].distribution_boards.push(without);

        let flags = EarthLeakageRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(flags.len(), 2);
        assert!(flags[0].passed);
        assert!(!flags[1].passed);
        assert_eq!(flags[1].corrected_value.as_deref(), Some("Add 63A 30mA ELCB"));
        assert_eq!(flags[1].related_board.as_deref(), Some("DB-2"));
    }

    #[test]
    fn test_split_suggestion() {
        let mut board = DistributionBoard::new("DB-1");
        board.circuits.push(circuit("P1", "power", 11));
        board.circuits.push(circuit("L1", "lighting", 10));
        board.circuits.push(circuit("L2", "lighting", 25));
        let mut spare = circuit("P9", "power", 30);
        spare.is_spare = tracked(true);
        board.circuits.push(spare);
        let project = project_with_board(board);

        let flags = CircuitPointsRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(
            rule_names(&flags),
            vec!["MAX_SOCKETS_PER_CIRCUIT", "MAX_LIGHTS_PER_CIRCUIT"]
        );
        assert_eq!(flags[0].severity, Severity::Critical);
        assert_eq!(flags[0].corrected_value.as_deref(), Some("Split into 2 circuits"));
        assert_eq!(flags[1].corrected_value.as_deref(), Some("Split into 3 circuits"));
    }

    #[test]
    fn test_spare_ways() {
        let mut board = DistributionBoard::new("DB-1");
        for i in 0..10 {
            board.circuits.push(circuit(&format!("P{}", i), "power", 2));
        }
        board.spare_ways = tracked(1);
        let project = project_with_board(board.clone());
        let flags = SpareWaysRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].corrected_value.as_deref(), Some("Upsize to 14-way DB"));

        board.spare_ways = tracked(2);
        let project = project_with_board(board);
        assert!(SpareWaysRule
            .evaluate(&project, &ComplianceConfig::default())
            .is_empty());
    }

    #[test]
    fn test_dedicated_circuits() {
        let mut project = project_with_board(DistributionBoard::new("DB-1"));
        let mut kitchen = Room::new("Kitchen");
        kitchen.room_type = tracked("Kitchen".to_string());
        kitchen.has_geyser = tracked(true);
        project.building_blocks[0].rooms.push(kitchen);

        let flags = DedicatedCircuitRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(
            rule_names(&flags),
            vec!["DEDICATED_STOVE_CIRCUIT", "DEDICATED_GEYSER_CIRCUIT"]
        );

        let board = &mut project.building_blocks[0].distribution_boards[0];
        board.circuits.push(circuit("S1", "stove", 1));
        let mut geyser = circuit("G1", "power", 1);
        geyser.description = tracked("Geyser 3kW".to_string());
        board.circuits.push(geyser);
        assert!(DedicatedCircuitRule
            .evaluate(&project, &ComplianceConfig::default())
            .is_empty());
    }

    #[test]
    fn test_cable_sizing() {
        let mut board = DistributionBoard::new("DB-1");
        let mut overloaded = circuit("P1", "power", 4);
        overloaded.cable_size_mm2 = tracked(2.5);
        overloaded.breaker_a = tracked(32);
        let mut mismatched = circuit("P2", "power", 4);
        mismatched.cable_size_mm2 = tracked(4.0);
        mismatched.breaker_a = tracked(26);
        let mut thin = circuit("L1", "lighting", 4);
        thin.cable_size_mm2 = tracked(1.0);
        thin.breaker_a = tracked(10);
        let mut fine = circuit("L2", "lighting", 4);
        fine.cable_size_mm2 = tracked(1.5);
        fine.breaker_a = tracked(10);
        board.circuits.extend([overloaded, mismatched, thin, fine]);
        let project = project_with_board(board);

        let flags = CableSizingRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(
            rule_names(&flags),
            vec![
                "CABLE_OVERCURRENT_PROTECTION",
                "CABLE_BREAKER_MISMATCH",
                "MIN_CABLE_SIZE_LIGHTING"
            ]
        );
        assert_eq!(flags[0].related_circuit.as_deref(), Some("P1"));
    }

    #[test]
    fn test_wet_area_sockets() {
        let mut project = Project::with_blocks("test", ["Main House"]);
        let mut bathroom = Room::new("Bath 1");
        bathroom.room_type = tracked("bathroom".to_string());
        bathroom
            .fixtures
            .absorb("double_socket_300", Some(2), Confidence::Extracted);
        let mut laundry = Room::new("Laundry");
        laundry.room_type = tracked("laundry".to_string());
        laundry
            .fixtures
            .absorb("double_socket_300", Some(1), Confidence::Extracted);
        laundry
            .fixtures
            .absorb("double_socket_waterproof", Some(1), Confidence::Extracted);
        project.building_blocks[0].rooms.extend([bathroom, laundry]);

        let flags = WetAreaRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(
            rule_names(&flags),
            vec!["WET_AREA_SOCKET_RESTRICTION", "WET_AREA_IP_RATING"]
        );
    }

    #[test]
    fn test_air_conditioning() {
        let mut board = DistributionBoard::new("DB-1");
        let mut ac = circuit("AC1", "ac", 1);
        ac.has_isolator = tracked(true);
        board.circuits.push(ac);
        let mut project = project_with_board(board);
        let mut office = Room::new("Office");
        office.fixtures.absorb("ac_units", Some(2), Confidence::Extracted);
        project.building_blocks[0].rooms.push(office);

        let flags = AirConditioningRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(
            rule_names(&flags),
            vec!["AC_DEDICATED_CIRCUIT", "AC_ISOLATOR_REQUIRED"]
        );
        assert_eq!(
            flags[0].corrected_value.as_deref(),
            Some("Add 1 dedicated AC circuits")
        );
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let mut board = DistributionBoard::new("DB-1");
        board.circuits.push(circuit("P1", "power", u32::MAX));
        board.spare_ways = tracked(u32::MAX);
        let mut project = project_with_board(board);

        for name in ["Office", "Boardroom"] {
            let mut room = Room::new(name);
            room.fixtures
                .absorb("ac_units", Some(3_000_000_000), Confidence::Extracted);
            project.building_blocks[0].rooms.push(room);
        }
        let mut bathroom = Room::new("Bath 1");
        bathroom.room_type = tracked("bathroom".to_string());
        bathroom
            .fixtures
            .absorb("double_socket_300", Some(3_000_000_000), Confidence::Extracted);
        bathroom
            .fixtures
            .absorb("single_socket_300", Some(3_000_000_000), Confidence::Extracted);
        project.building_blocks[0].rooms.push(bathroom);

        let config = ComplianceConfig::default();
        let ac = AirConditioningRule.evaluate(&project, &config);
        assert_eq!(
            ac[0].corrected_value.as_deref(),
            Some(format!("Add {} dedicated AC circuits", u32::MAX).as_str())
        );

        let wet = WetAreaRule.evaluate(&project, &config);
        assert_eq!(
            rule_names(&wet),
            vec!["WET_AREA_SOCKET_RESTRICTION", "WET_AREA_IP_RATING"]
        );
        assert!(wet[0].message.contains(&u32::MAX.to_string()));

        assert!(SpareWaysRule.evaluate(&project, &config).is_empty());
        let points = CircuitPointsRule.evaluate(&project, &config);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_site_cables() {
        let mut project = Project::new("site");
        let mut long = SiteCableRun::new("Kiosk", "DB-Pool");
        long.length_m = Tracked::new(120.0, Confidence::Estimated);
        long.cable_size_mm2 = tracked(10.0);
        long.cable_type = tracked("PVC".to_string());
        long.is_underground = tracked(true);
        let mut short = SiteCableRun::new("Kiosk", "DB-Gate");
        short.length_m = tracked(40.0);
        short.cable_size_mm2 = tracked(6.0);
        short.cable_type = tracked("PVC/SWA/PVC".to_string());
        short.needs_trenching = tracked(true);
        project.site_cable_runs.extend([long, short]);

        let config = ComplianceConfig::default();
        let site = SiteCableRule.evaluate(&project, &config);
        assert_eq!(
            rule_names(&site),
            vec!["CABLE_LENGTH_ESTIMATED", "VOLTAGE_DROP_WARNING"]
        );
        assert!(site[0].passed);
        assert!(!site[1].auto_corrected);

        let external = ExternalInstallationRule.evaluate(&project, &config);
        assert_eq!(
            rule_names(&external),
            vec![
                "UNDERGROUND_CABLE_TYPE",
                "UNDERGROUND_BURIAL_DEPTH",
                "UNDERGROUND_BURIAL_DEPTH"
            ]
        );
    }

    #[test]
    fn test_external_lighting_note() {
        let mut project = Project::new("site");
        let mut lights = takeoff_domain::FixtureCounts::new();
        lights.absorb("pole_light_60w", Some(4), Confidence::Extracted);
        project.outside_lights = Some(lights);

        let flags = ExternalInstallationRule.evaluate(&project, &ComplianceConfig::default());
        assert_eq!(rule_names(&flags), vec!["EXTERNAL_IP_RATING"]);
        assert!(flags[0].passed);
        assert_eq!(flags[0].severity, Severity::Info);
    }
}
