//! Check command implementation.

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use takeoff_compliance::{cross_reference, ComplianceEngine, ComplianceReport, CrossReferenceReport};
use takeoff_domain::Project;

/// Run the compliance engine and the cross-reference over a project.
pub fn check_project(
    project: &Project,
    config: &Config,
) -> Result<(ComplianceReport, CrossReferenceReport)> {
    let engine = ComplianceEngine::new(config.compliance.clone())?;
    Ok((engine.evaluate(project), cross_reference(project)))
}

/// Execute the check command.
pub fn execute_check(args: CheckArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let project = super::read_project(&args.project)?;
    let (report, crossref) = check_project(&project, config)?;
    println!("{}", formatter.format_check(&report, &crossref)?);

    if args.deny_critical && report.has_critical_issues() {
        let critical = report.failures().iter().filter(|f| f.is_critical_failure()).count();
        return Err(CliError::CriticalIssues(critical));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CheckArgs;
    use crate::config::OutputFormat;
    use takeoff_domain::{Confidence, DistributionBoard, Tracked};

    fn write_board(dir: &std::path::Path, elcb: bool) -> std::path::PathBuf {
        let mut project = Project::with_blocks("Clubhouse", ["Main House"]);
        let mut board = DistributionBoard::new("DB-1");
        board.earth_leakage = Tracked::new(elcb, Confidence::Extracted);
        board.surge_protection = Tracked::new(true, Confidence::Extracted);
        board.spare_ways = Tracked::new(2, Confidence::Extracted);
        project.building_blocks[0].distribution_boards.push(board);

        let path = dir.join("project.json");
        super::super::write_project(&path, &project).unwrap();
        path
    }

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    #[test]
    fn test_deny_critical_fails_on_missing_elcb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_board(dir.path(), false);
        let args = CheckArgs {
            project: path,
            deny_critical: true,
        };
        let result = execute_check(args, &Config::default(), &formatter());
        assert!(matches!(result, Err(CliError::CriticalIssues(1))));
    }

    #[test]
    fn test_clean_board_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_board(dir.path(), true);
        let args = CheckArgs {
            project: path,
            deny_critical: true,
        };
        assert!(execute_check(args, &Config::default(), &formatter()).is_ok());
    }

    #[test]
    fn test_critical_issues_reported_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_board(dir.path(), false);
        let args = CheckArgs {
            project: path,
            deny_critical: false,
        };
        assert!(execute_check(args, &Config::default(), &formatter()).is_ok());
    }

    #[test]
    fn test_disabled_rule_family() {
        let project = Project::with_blocks("p", ["Main House"]);
        let mut config = Config::default();
        config.compliance.check_earth_leakage = false;
        let (report, crossref) = check_project(&project, &config).unwrap();
        assert_eq!(report.total_checks(), 0);
        assert!(crossref.links.is_empty());
    }

    #[test]
    fn test_invalid_compliance_config() {
        let mut config = Config::default();
        config.compliance.max_socket_points = 0;
        let result = check_project(&Project::new("p"), &config);
        assert!(matches!(result, Err(CliError::Compliance(_))));
    }
}
