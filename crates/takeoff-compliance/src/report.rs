//! Compliance flags and the scored report

use crate::error::ComplianceError;
use serde::{Deserialize, Serialize};

/// Default standard reference on a flag
pub const STANDARD: &str = "SANS 10142-1";

/// Penalty subtracted per critical failure
pub const CRITICAL_PENALTY: f64 = 10.0;

/// How serious a failed check is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before sign-off
    Critical,
    /// Should be reviewed
    Warning,
    /// Informational note
    Info,
}

impl Severity {
    /// Get the severity as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluated check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// Rule identifier, e.g. `ELCB_REQUIRED`
    pub rule_name: String,
    /// Severity of a failure of this check
    pub severity: Severity,
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable finding
    pub message: String,
    /// Whether `corrected_value` is a concrete remedy
    #[serde(default)]
    pub auto_corrected: bool,
    /// Suggested remedy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_value: Option<String>,
    /// Clause of the wiring code
    pub standard_ref: String,
    /// Block the finding belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_block: Option<String>,
    /// Board the finding belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_board: Option<String>,
    /// Circuit the finding belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_circuit: Option<String>,
}

impl Flag {
    fn new(rule_name: &str, severity: Severity, passed: bool, message: String) -> Self {
        Self {
            rule_name: rule_name.to_string(),
            severity,
            passed,
            message,
            auto_corrected: false,
            corrected_value: None,
            standard_ref: STANDARD.to_string(),
            related_block: None,
            related_board: None,
            related_circuit: None,
        }
    }

    /// A failed check
    pub fn fail(rule_name: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(rule_name, severity, false, message.into())
    }

    /// A passed check or an informational note
    pub fn pass(rule_name: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self::new(rule_name, severity, true, message.into())
    }

    /// Attach a concrete remedy
    pub fn corrected(mut self, value: impl Into<String>) -> Self {
        self.auto_corrected = true;
        self.corrected_value = Some(value.into());
        self
    }

    /// Attach advice that is not a concrete remedy
    pub fn advice(mut self, value: impl Into<String>) -> Self {
        self.corrected_value = Some(value.into());
        self
    }

    /// Set the standard reference
    pub fn standard(mut self, reference: impl Into<String>) -> Self {
        self.standard_ref = reference.into();
        self
    }

    /// Set the related block
    pub fn in_block(mut self, block: &str) -> Self {
        self.related_block = Some(block.to_string());
        self
    }

    /// Set the related board
    pub fn on_board(mut self, board: &str) -> Self {
        self.related_board = Some(board.to_string());
        self
    }

    /// Set the related circuit
    pub fn on_circuit(mut self, circuit: &str) -> Self {
        self.related_circuit = Some(circuit.to_string());
        self
    }

    /// Failed at Critical severity
    pub fn is_critical_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Critical
    }
}

/// Compliance score from check counts
///
/// Percentage first, then the critical penalty, then the clamp to [0, 100].
/// No checks at all scores 100.
pub fn compliance_score(passed: usize, total: usize, critical_failures: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let percentage = passed as f64 / total as f64 * 100.0;
    (percentage - CRITICAL_PENALTY * critical_failures as f64).clamp(0.0, 100.0)
}

/// Result of evaluating every enabled rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Every flag, in rule order
    pub flags: Vec<Flag>,
    /// Checks that passed
    pub passed: usize,
    /// Critical failures
    pub failed: usize,
    /// Warning failures
    pub warnings: usize,
    /// Flags carrying a concrete remedy
    pub auto_corrections: usize,
    /// Score in [0, 100]
    pub compliance_score: f64,
}

impl ComplianceReport {
    /// Tally flags and compute the score
    pub fn from_flags(flags: Vec<Flag>) -> Self {
        let passed = flags.iter().filter(|f| f.passed).count();
        let failed = flags.iter().filter(|f| f.is_critical_failure()).count();
        let warnings = flags
            .iter()
            .filter(|f| !f.passed && f.severity == Severity::Warning)
            .count();
        let auto_corrections = flags.iter().filter(|f| f.auto_corrected).count();
        let compliance_score = compliance_score(passed, flags.len(), failed);

        Self {
            flags,
            passed,
            failed,
            warnings,
            auto_corrections,
            compliance_score,
        }
    }

    /// Number of checks evaluated
    pub fn total_checks(&self) -> usize {
        self.flags.len()
    }

    /// Whether any Critical check failed
    pub fn has_critical_issues(&self) -> bool {
        self.failed > 0
    }

    /// Failed checks, most severe first
    pub fn failures(&self) -> Vec<&Flag> {
        let mut failures: Vec<&Flag> = self.flags.iter().filter(|f| !f.passed).collect();
        failures.sort_by_key(|f| f.severity as u8);
        failures
    }

    /// Flags raised by one rule
    pub fn by_rule<'a>(&'a self, rule_name: &'a str) -> impl Iterator<Item = &'a Flag> + 'a {
        self.flags.iter().filter(move |f| f.rule_name == rule_name)
    }

    /// Serialize the report as pretty JSON
    pub fn to_json(&self) -> Result<String, ComplianceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_order_of_operations() {
        // one failing critical check out of one: 0 - 10 clamps to 0
        assert_eq!(compliance_score(0, 1, 1), 0.0);
        // 3 of 4 passed with one critical failure: 75 - 10
        assert_eq!(compliance_score(3, 4, 1), 65.0);
        assert_eq!(compliance_score(4, 4, 0), 100.0);
        assert_eq!(compliance_score(0, 0, 0), 100.0);
    }

    #[test]
    fn test_report_tallies() {
        let flags = vec![
            Flag::pass("ELCB_REQUIRED", Severity::Critical, "present"),
            Flag::fail("SURGE_PROTECTION", Severity::Warning, "missing").corrected("Add Type 2 SPD"),
            Flag::fail("MAX_LIGHTS_PER_CIRCUIT", Severity::Critical, "too many"),
            Flag::pass("EXTERNAL_IP_RATING", Severity::Info, "note"),
        ];
        let report = ComplianceReport::from_flags(flags);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.warnings, 1);
        assert_eq!(report.auto_corrections, 1);
        assert_eq!(report.total_checks(), 4);
        assert_eq!(report.compliance_score, 40.0);
        assert!(report.has_critical_issues());

        let failures = report.failures();
        assert_eq!(failures[0].rule_name, "MAX_LIGHTS_PER_CIRCUIT");
        assert_eq!(failures[1].rule_name, "SURGE_PROTECTION");
    }

    #[test]
    fn test_flag_json_shape() {
        let flag = Flag::fail("ELCB_REQUIRED", Severity::Critical, "DB-1: none")
            .corrected("Add 63A 30mA ELCB")
            .standard("SANS 10142-1 clause 6.7")
            .on_board("DB-1");
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["auto_corrected"], true);
        assert_eq!(json["related_board"], "DB-1");
        assert!(json.get("related_circuit").is_none());
    }
}
