//! Property tests for the Merge Engine

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use takeoff_domain::{Circuit, Confidence, DistributionBoard, Project, Room};
use takeoff_extractor::{merge, MergeEngine, Payload, PayloadKind};

const FIXTURE_KEYS: &[&str] = &[
    "downlight_led_6w",
    "bulkhead_26w",
    "double_socket_300",
    "double_socket_waterproof",
    "switch_1lever_1way",
    "isolator_30a",
];

fn label() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["extracted", "inferred", "estimated", "EXTRACTED", "unsure"])
}

fn block_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["Main House", "main house", "MAIN HOUSE", "  Main House "])
}

fn circuits() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (0u32..40, 0u32..20, prop::option::of(0.0f64..3000.0), any::<bool>(), label()),
        0..5,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (breaker, points, wattage, spare, confidence))| {
                json!({
                    "id": format!("L{}", i),
                    "breaker_a": breaker,
                    "num_points": points.to_string(),
                    "wattage_w": wattage,
                    "is_spare": if spare { "yes" } else { "no" },
                    "confidence": confidence,
                    "controlled_circuits": ["C1", "C1"],
                })
            })
            .collect()
    })
}

fn sld_value() -> impl Strategy<Value = Value> {
    (
        block_name(),
        prop::collection::vec((0u32..125, any::<bool>(), 0u32..6, label(), circuits()), 0..4),
    )
        .prop_map(|(block, boards)| {
            let boards: Vec<Value> = boards
                .into_iter()
                .enumerate()
                .map(|(i, (main, elcb, spare_ways, confidence, circuits))| {
                    json!({
                        "name": format!("DB-{}", i),
                        "main_breaker_a": main,
                        "earth_leakage": elcb,
                        "spare_ways": spare_ways,
                        "confidence": confidence,
                        "circuits": circuits,
                    })
                })
                .collect();
            json!({ "building_block": block, "distribution_boards": boards })
        })
}

fn fixtures() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(prop::sample::select(FIXTURE_KEYS.to_vec()), 0u32..12, 0..4)
        .prop_map(|counts| {
            counts
                .into_iter()
                .map(|(key, count)| (key.to_string(), json!(count)))
                .collect()
        })
}

fn rooms_value(prefix: &'static str) -> impl Strategy<Value = Value> {
    (
        block_name(),
        prop::collection::vec(
            (
                prop::option::of(1.0f64..80.0),
                label(),
                fixtures(),
                prop::sample::subsequence(vec!["L1", "L2", "P1"], 0..3),
            ),
            0..4,
        ),
    )
        .prop_map(move |(block, rooms)| {
            let rooms: Vec<Value> = rooms
                .into_iter()
                .enumerate()
                .map(|(i, (area, confidence, fixtures, refs))| {
                    json!({
                        "name": format!("{} {}", prefix, i),
                        "area_m2": area,
                        "confidence": confidence,
                        "fixtures": fixtures,
                        "circuit_refs": refs,
                    })
                })
                .collect();
            json!({ "building_block": block, "rooms": rooms })
        })
}

fn site_value() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec((0u32..400, label(), any::<bool>()), 0..3),
        fixtures(),
    )
        .prop_map(|(runs, lights)| {
            let runs: Vec<Value> = runs
                .into_iter()
                .enumerate()
                .map(|(i, (length, confidence, underground))| {
                    json!({
                        "from_point": "Kiosk",
                        "to_point": format!("DB-{}", i),
                        "length_m": length,
                        "length_confidence": confidence,
                        "is_underground": underground,
                    })
                })
                .collect();
            json!({ "site_cable_runs": runs, "outside_lights": lights })
        })
}

/// Lighting, plugs and combined layouts, each over its own rooms
fn layouts() -> impl Strategy<Value = [Value; 3]> {
    (
        rooms_value("Lighting Room"),
        rooms_value("Plugs Room"),
        rooms_value("Room"),
    )
        .prop_map(|(lighting, plugs, combined)| [lighting, plugs, combined])
}

fn payloads(sld: Value, layouts: [Value; 3], site: Value) -> Vec<Payload> {
    let [lighting, plugs, combined] = layouts;
    vec![
        Payload::from_value(PayloadKind::Sld, sld).unwrap(),
        Payload::from_value(PayloadKind::Lighting, lighting).unwrap(),
        Payload::from_value(PayloadKind::Plugs, plugs).unwrap(),
        Payload::from_value(PayloadKind::Combined, combined).unwrap(),
        Payload::from_value(PayloadKind::SiteInfra, site).unwrap(),
    ]
}

fn pinned_project() -> Project {
    let mut project = Project::with_blocks("Pinned", ["Main House"]);
    let block = &mut project.building_blocks[0];

    let mut board = DistributionBoard::new("DB-0");
    board.main_breaker_a.set_manual(40);
    board.earth_leakage.set_manual(false);
    let mut circuit = Circuit::new("L0");
    circuit.num_points.set_manual(7);
    board.circuits.push(circuit);
    block.distribution_boards.push(board);

    let mut room = Room::new("Room 0");
    room.fixtures.set_manual("downlight_led_6w", 3);
    block.rooms.push(room);
    project
}

fn assert_pins_hold(project: &Project) {
    let block = &project.building_blocks[0];
    let board = block.board("DB-0").unwrap();
    assert_eq!(board.main_breaker_a.value, 40);
    assert!(board.main_breaker_a.is_manual());
    assert!(!board.earth_leakage.value);
    assert!(board.earth_leakage.is_manual());
    let circuit = board.circuit("L0").unwrap();
    assert_eq!(circuit.num_points.value, 7);
    assert!(circuit.num_points.is_manual());
    let room = block.room("Room 0").unwrap();
    assert_eq!(room.fixtures.get("downlight_led_6w"), 3);
    assert_eq!(
        room.fixtures.entry("downlight_led_6w").unwrap().confidence,
        Confidence::Manual
    );
}

proptest! {
    #[test]
    fn accumulating_twice_changes_nothing(sld in sld_value(), layouts in layouts(), site in site_value()) {
        let payloads = payloads(sld, layouts, site);
        prop_assert_eq!(payloads.len(), PayloadKind::ALL.len());
        let mut project = Project::with_blocks("Clubhouse", ["Main House"]);
        for payload in &payloads {
            merge(payload, &mut project);
        }
        let settled = project.clone();

        for payload in &payloads {
            let report = merge(payload, &mut project);
            prop_assert_eq!(report.fields_changed, 0);
            prop_assert_eq!(report.entities_created(), 0);
        }
        prop_assert_eq!(project, settled);
    }

    #[test]
    fn block_names_match_regardless_of_case(sld in sld_value(), layouts in layouts()) {
        let payloads = payloads(sld, layouts, json!({}));
        let mut project = Project::with_blocks("Clubhouse", ["Main House"]);
        for payload in &payloads {
            let report = merge(payload, &mut project);
            prop_assert_eq!(report.blocks_created, 0);
            prop_assert!(report.warnings.is_empty());
        }
        prop_assert_eq!(project.building_blocks.len(), 1);
        prop_assert_eq!(project.building_blocks[0].name.as_str(), "Main House");
    }

    #[test]
    fn manual_values_survive_both_modes(sld in sld_value(), layouts in layouts(), site in site_value()) {
        let payloads = payloads(sld, layouts, site);
        let mut project = pinned_project();
        for payload in &payloads {
            merge(payload, &mut project);
        }
        assert_pins_hold(&project);

        let engine = MergeEngine::replace();
        for payload in &payloads {
            engine.merge(payload, &mut project);
        }
        assert_pins_hold(&project);
    }

    #[test]
    fn known_values_are_never_blanked(sld in sld_value()) {
        let payload = Payload::from_value(PayloadKind::Sld, sld).unwrap();
        let mut project = Project::with_blocks("Clubhouse", ["Main House"]);
        merge(&payload, &mut project);
        let before = project.clone();

        let blank = Payload::from_value(
            PayloadKind::Sld,
            json!({
                "distribution_boards": before.building_blocks[0]
                    .distribution_boards
                    .iter()
                    .map(|b| json!({"name": b.name, "main_breaker_a": 0, "earth_leakage": false}))
                    .collect::<Vec<_>>()
            }),
        )
        .unwrap();
        let report = merge(&blank, &mut project);
        prop_assert_eq!(report.fields_changed, 0);
        prop_assert_eq!(project, before);
    }
}
