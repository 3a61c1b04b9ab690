//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde::Serialize;
use serde_json::Value;
use takeoff_compliance::{ComplianceReport, CrossReferenceReport, Flag, Severity};
use takeoff_domain::{ConfidenceBreakdown, Project};
use takeoff_review::CorrectionLog;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Headline numbers for a reconciled or extracted project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Project name
    pub project: String,
    /// Building blocks
    pub blocks: usize,
    /// Distribution boards
    pub boards: usize,
    /// Circuits across all boards
    pub circuits: usize,
    /// Rooms across all blocks
    pub rooms: usize,
    /// Site cable runs
    pub cable_runs: usize,
    /// Pages submitted
    pub pages_processed: u32,
    /// Pages that yielded data
    pub pages_with_data: u32,
    /// Confidence of the settled graph
    pub confidence: ConfidenceBreakdown,
    /// Escalation states visited, when a pipeline ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
    /// Tokens spent
    pub tokens_used: u64,
    /// Provider cost
    pub cost: f64,
    /// Isolated failures collected along the way
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Summarize a project as it stands.
    pub fn new(project: &Project, confidence: ConfidenceBreakdown, warnings: Vec<String>) -> Self {
        Self {
            project: project.name.clone(),
            blocks: project.building_blocks.len(),
            boards: project.boards().count(),
            circuits: project.total_circuits(),
            rooms: project.rooms().count(),
            cable_runs: project.site_cable_runs.len(),
            pages_processed: project.pages_processed,
            pages_with_data: project.pages_with_data,
            confidence,
            escalation: None,
            tokens_used: 0,
            cost: 0.0,
            warnings,
        }
    }

    /// Attach provider usage and the escalation path.
    pub fn with_usage(mut self, escalation: impl Into<String>, tokens_used: u64, cost: f64) -> Self {
        self.escalation = Some(escalation.into());
        self.tokens_used = tokens_used;
        self.cost = cost;
        self
    }
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a run summary.
    pub fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            OutputFormat::Quiet => Ok(format!("{:.2}", summary.confidence.overall)),
            OutputFormat::Table => Ok(self.format_summary_table(summary)),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Item", "Value"]);
        let rows = [
            ("Project", summary.project.clone()),
            ("Blocks", summary.blocks.to_string()),
            ("Boards", summary.boards.to_string()),
            ("Circuits", summary.circuits.to_string()),
            ("Rooms", summary.rooms.to_string()),
            ("Cable runs", summary.cable_runs.to_string()),
            (
                "Pages with data",
                format!("{} / {}", summary.pages_with_data, summary.pages_processed),
            ),
            ("Completeness", format!("{:.2}", summary.confidence.completeness)),
            (
                "Item confidence",
                format!(
                    "{:.2} ({} items)",
                    summary.confidence.item_confidence, summary.confidence.scored_items
                ),
            ),
            ("Overall", format!("{:.2}", summary.confidence.overall)),
        ];
        for (item, value) in rows {
            builder.push_record([item.to_string(), value]);
        }
        if let Some(escalation) = &summary.escalation {
            builder.push_record(["Escalation".to_string(), escalation.clone()]);
            builder.push_record(["Tokens".to_string(), summary.tokens_used.to_string()]);
            builder.push_record(["Cost".to_string(), format!("{:.4}", summary.cost)]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut output = table.to_string();
        for warning in &summary.warnings {
            output.push('\n');
            output.push_str(&self.warning(warning));
        }
        output
    }

    /// Format compliance and cross-reference results together.
    pub fn format_check(&self, report: &ComplianceReport, crossref: &CrossReferenceReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "compliance": report,
                "cross_reference": crossref,
            }))?),
            OutputFormat::Quiet => Ok(format!(
                "{:.1} {}",
                report.compliance_score,
                crossref.discrepancies.len()
            )),
            OutputFormat::Table => {
                let mut sections = vec![self.format_flags_table(&report.flags)];
                sections.push(self.score_line(report));
                sections.push(self.format_discrepancies_table(crossref));
                Ok(sections.join("\n"))
            }
        }
    }

    fn format_flags_table(&self, flags: &[Flag]) -> String {
        if flags.is_empty() {
            return self.colorize("No compliance checks applied.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Rule", "Severity", "Result", "Location", "Message", "Correction"]);

        for flag in flags {
            let result = if flag.passed {
                self.colorize("PASS", "green")
            } else if flag.severity == Severity::Critical {
                self.colorize("FAIL", "red")
            } else {
                self.colorize("FAIL", "yellow")
            };
            let location: Vec<&str> = [&flag.related_block, &flag.related_board, &flag.related_circuit]
                .into_iter()
                .filter_map(|part| part.as_deref())
                .collect();
            builder.push_record([
                flag.rule_name.clone(),
                flag.severity.as_str().to_string(),
                result,
                location.join(" / "),
                flag.message.clone(),
                flag.corrected_value.clone().unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn score_line(&self, report: &ComplianceReport) -> String {
        let message = format!(
            "Compliance score {:.1} ({} passed, {} failed, {} warnings of {} checks)",
            report.compliance_score,
            report.passed,
            report.failed,
            report.warnings,
            report.total_checks()
        );
        if report.has_critical_issues() {
            self.error(&message)
        } else if report.warnings > 0 {
            self.warning(&message)
        } else {
            self.success(&message)
        }
    }

    fn format_discrepancies_table(&self, crossref: &CrossReferenceReport) -> String {
        let headline = format!(
            "Cross-reference: {} matched, {} conflicts, {} circuits linked",
            crossref.matched,
            crossref.conflicts,
            crossref.links.len()
        );
        if crossref.discrepancies.is_empty() {
            return self.info(&headline);
        }

        let mut builder = Builder::default();
        builder.push_record(["Block", "Board", "Circuit", "Declared", "Observed", "Diff", "Severity"]);
        for d in &crossref.discrepancies {
            builder.push_record([
                d.block.clone(),
                d.board.clone(),
                d.circuit.clone(),
                d.declared.to_string(),
                d.observed.to_string(),
                d.diff.to_string(),
                d.severity.as_str().to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        format!("{}\n{}", self.warning(&headline), table)
    }

    /// Format a correction log.
    pub fn format_correction_log(&self, log: &CorrectionLog) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(log)?),
            OutputFormat::Quiet => Ok(format!("{:.1}", log.accuracy_pct())),
            OutputFormat::Table => {
                if log.is_empty() {
                    return Ok(self.colorize("No corrections applied.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Field", "Original", "Corrected", "Type", "Block"]);
                for entry in &log.corrections {
                    builder.push_record([
                        entry.field_path.clone(),
                        display_value(&entry.original_value),
                        display_value(&entry.corrected_value),
                        entry.item_type.clone(),
                        entry.building_block.clone(),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let footer = format!(
                    "{} corrected, {} added, {} removed; accuracy {:.1}% of {} items",
                    log.total_corrected,
                    log.total_added,
                    log.total_removed,
                    log.accuracy_pct(),
                    log.total_ai_items
                );
                Ok(format!("{}\n{}", table, self.info(&footer)))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Render a JSON value without quotes around strings.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
