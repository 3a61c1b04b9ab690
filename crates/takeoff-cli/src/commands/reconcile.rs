//! Reconcile command implementation.

use crate::cli::ReconcileArgs;
use crate::error::{CliError, Result};
use crate::output::{Formatter, RunSummary};
use std::fs;
use std::path::{Path, PathBuf};
use takeoff_domain::{score_project, ConfidenceBreakdown, Project, ScoringConfig};
use takeoff_extractor::{ingest, MergeReport, PayloadKind};
use tracing::{info, warn};

/// File stem prefixes and the payload kind each selects, longest first.
const KIND_PREFIXES: &[&str] = &[
    "outside_lights",
    "site_infra",
    "combined",
    "lighting",
    "outside",
    "plugs",
    "power",
    "site",
    "sld",
];

/// Payload kind named by a file stem prefix.
pub fn kind_for_stem(stem: &str) -> Option<PayloadKind> {
    let stem = stem.to_lowercase();
    KIND_PREFIXES
        .iter()
        .find(|prefix| stem.starts_with(*prefix))
        .and_then(|prefix| PayloadKind::parse(prefix))
}

/// Result of merging a payload directory.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// The merged project
    pub project: Project,
    /// Combined merge counters
    pub merge_report: MergeReport,
    /// Score of the merged graph
    pub confidence: ConfidenceBreakdown,
    /// Skipped files and merge warnings
    pub warnings: Vec<String>,
}

/// Merge every `*.json` payload in `dir`, in file name order.
pub fn reconcile_dir(
    dir: &Path,
    name: &str,
    blocks: &[String],
    pages: Option<u32>,
) -> Result<Reconciliation> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!("{} is not a directory", dir.display())));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .collect();
    files.sort();

    let mut project = Project::with_blocks(name, blocks.iter().cloned());
    let mut merge_report = MergeReport::default();
    let mut warnings = Vec::new();
    let mut payload_files = 0u32;
    let mut with_data = 0u32;

    for path in &files {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let Some(kind) = kind_for_stem(stem) else {
            let message = format!("{}: no payload kind in file name; skipped", path.display());
            warn!("{}", message);
            warnings.push(message);
            continue;
        };
        payload_files += 1;

        let text = fs::read_to_string(path)?;
        let report = ingest(kind, &text, &mut project);
        if report.payload_entities > 0 {
            with_data += 1;
        }
        info!(
            file = %path.display(),
            kind = %kind,
            created = report.entities_created(),
            touched = report.entities_touched(),
            "Merged payload file"
        );
        warnings.extend(report.warnings.iter().cloned());
        merge_report.combine(report);
    }

    project.pages_processed = pages.unwrap_or(payload_files);
    project.pages_with_data = with_data.min(project.pages_processed);
    let confidence = score_project(&project, &ScoringConfig::default());

    Ok(Reconciliation {
        project,
        merge_report,
        confidence,
        warnings,
    })
}

/// Execute the reconcile command.
pub fn execute_reconcile(args: ReconcileArgs, formatter: &Formatter) -> Result<()> {
    let name = args.name.clone().unwrap_or_else(|| {
        args.dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string()
    });

    let result = reconcile_dir(&args.dir, &name, &args.blocks, args.pages)?;
    let summary = RunSummary::new(&result.project, result.confidence, result.warnings);
    println!("{}", formatter.format_summary(&summary)?);

    if let Some(output) = &args.output {
        super::write_project(output, &result.project)?;
        eprintln!("{}", formatter.success(&format!("Project written to {}", output.display())));
    }

    Ok(())
}
