//! Correct command implementation.

use crate::cli::CorrectArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fs;
use std::path::Path;
use takeoff_domain::Project;
use takeoff_review::{CorrectionEntry, ReviewOutcome, ReviewSession};

/// Read a JSON array of corrections.
pub fn read_corrections(path: &Path) -> Result<Vec<CorrectionEntry>> {
    let contents = fs::read_to_string(path)?;
    let entries: Vec<CorrectionEntry> = serde_json::from_str(&contents)?;
    if entries.is_empty() {
        return Err(CliError::InvalidInput("No corrections provided".to_string()));
    }
    Ok(entries)
}

/// Apply every correction, stopping at the first one that fails.
pub fn apply_corrections(project: Project, entries: Vec<CorrectionEntry>) -> Result<ReviewOutcome> {
    let mut session = ReviewSession::new(project);
    session.apply_all(entries)?;
    Ok(session.finish())
}

/// Execute the correct command.
pub fn execute_correct(args: CorrectArgs, formatter: &Formatter) -> Result<()> {
    let project = super::read_project(&args.project)?;
    let entries = read_corrections(&args.corrections)?;
    let outcome = apply_corrections(project, entries)?;

    println!("{}", formatter.format_correction_log(&outcome.log)?);

    match &args.output {
        Some(output) => {
            super::write_project(output, &outcome.project)?;
            eprintln!("{}", formatter.success(&format!("Project written to {}", output.display())));
        }
        None => eprintln!("{}", formatter.info("Dry run; pass -o to save the corrected project")),
    }
    if let Some(log_path) = &args.log {
        fs::write(log_path, serde_json::to_string_pretty(&outcome.log)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use takeoff_domain::{Confidence, Room};
    use takeoff_review::{CorrectionLog, ReviewError};

    fn project() -> Project {
        let mut project = Project::with_blocks("Clubhouse", ["Main House"]);
        let mut lounge = Room::new("Lounge");
        lounge
            .fixtures
            .absorb("downlight_led_6w", Some(6), Confidence::Extracted);
        project.building_blocks[0].rooms.push(lounge);
        project
    }

    #[test]
    fn test_correct_writes_project_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("project.json");
        let corrections_path = dir.path().join("corrections.json");
        let output = dir.path().join("corrected.json");
        let log = dir.path().join("log.json");

        super::super::write_project(&project_path, &project()).unwrap();
        fs::write(
            &corrections_path,
            r#"[{"field_path": "blocks.Main House.rooms.Lounge.fixtures.downlight_led_6w", "corrected_value": 8, "item_type": "fixture_count"}]"#,
        )
        .unwrap();

        let args = CorrectArgs {
            project: project_path,
            corrections: corrections_path,
            output: Some(output.clone()),
            log: Some(log.clone()),
        };
        execute_correct(args, &Formatter::new(OutputFormat::Quiet, false)).unwrap();

        let corrected = super::super::read_project(&output).unwrap();
        let lounge = corrected.block("Main House").unwrap().room("Lounge").unwrap();
        assert_eq!(lounge.fixtures.get("downlight_led_6w"), 8);
        assert!(lounge.fixtures.entry("downlight_led_6w").unwrap().is_manual());

        let log: CorrectionLog = serde_json::from_str(&fs::read_to_string(log).unwrap()).unwrap();
        assert_eq!(log.total_corrected, 1);
        assert_eq!(log.corrections[0].original_value, serde_json::json!(6));
    }

    #[test]
    fn test_bad_path_stops_the_batch() {
        let entries = vec![
            CorrectionEntry::new("blocks.Main House.rooms.Lounge.fixtures.downlight_led_6w", 8, "fixture_count"),
            CorrectionEntry::new("blocks.Main House.rooms.Attic.area_m2", 12.0, "area"),
        ];
        let result = apply_corrections(project(), entries);
        assert!(matches!(result, Err(CliError::Review(ReviewError::NotFound { .. }))));
    }

    #[test]
    fn test_empty_corrections_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrections.json");
        fs::write(&path, "[]").unwrap();
        assert!(matches!(read_corrections(&path), Err(CliError::InvalidInput(_))));
    }
}
