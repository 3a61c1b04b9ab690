//! Reconcile, check and correct a small drawing set through the CLI library

use std::fs;
use takeoff_cli::commands::check::check_project;
use takeoff_cli::commands::correct::apply_corrections;
use takeoff_cli::commands::reconcile::reconcile_dir;
use takeoff_cli::Config;
use takeoff_compliance::LinkStatus;
use takeoff_review::CorrectionEntry;

const SLD: &str = r#"```json
{
  "building_block": "Main House",
  "distribution_boards": [{
    "name": "DB-GF",
    "earth_leakage": "yes",
    "surge_protection": true,
    "spare_ways": 3,
    "circuits": [
      {"id": "L1", "type": "lighting", "num_points": 8, "breaker_a": 10, "cable_size_mm2": 1.5},
      {"id": "P1", "type": "power", "num_points": 6, "breaker_a": 16, "cable_size_mm2": 2.5},
    ]
  }]
}
```"#;

const LIGHTING: &str = r#"{"building_block": "Main House", "rooms": [
  {"name": "Lounge", "circuit_refs": ["L1"], "fixtures": {"downlight_led_6w": 5}},
  {"name": "Bedroom", "circuit_refs": ["L1"], "fixtures": {"downlight_led_6w": 3}}
]}"#;

const PLUGS: &str = r#"{"building_block": "Main House", "rooms": [
  {"name": "Lounge", "circuit_refs": ["P1"], "fixtures": {"double_socket_300": 3}},
  {"name": "Bedroom", "circuit_refs": ["P1"], "fixtures": {"double_socket_300": 2}}
]}"#;

#[test]
fn reconcile_then_check_then_correct() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sld_01.json"), SLD).unwrap();
    fs::write(dir.path().join("lighting_02.json"), LIGHTING).unwrap();
    fs::write(dir.path().join("plugs_03.json"), PLUGS).unwrap();

    let result = reconcile_dir(dir.path(), "Cottage", &["Main House".to_string()], Some(4)).unwrap();
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.project.pages_with_data, 3);
    assert_eq!(result.project.building_blocks.len(), 1);
    assert_eq!(result.project.building_blocks[0].rooms.len(), 2);

    let (report, crossref) = check_project(&result.project, &Config::default()).unwrap();
    assert!(!report.has_critical_issues());
    let status = |id: &str| {
        crossref
            .links
            .iter()
            .find(|l| l.circuit == id)
            .map(|l| l.status)
    };
    assert_eq!(status("L1"), Some(LinkStatus::Matched));
    assert_eq!(status("P1"), Some(LinkStatus::Conflict));
    assert_eq!(crossref.discrepancies[0].observed, 5);

    let outcome = apply_corrections(
        result.project,
        vec![CorrectionEntry::new(
            "blocks.Main House.rooms.Bedroom.fixtures.double_socket_300",
            3,
            "fixture_count",
        )],
    )
    .unwrap();
    let (_, crossref) = check_project(&outcome.project, &Config::default()).unwrap();
    assert!(crossref.discrepancies.is_empty());
    assert_eq!(crossref.matched, 2);
    assert_eq!(outcome.log.total_corrected, 1);
}
