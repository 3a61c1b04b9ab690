//! The compliance engine

use crate::config::ComplianceConfig;
use crate::error::ComplianceError;
use crate::report::ComplianceReport;
use crate::rules::{standard_rules, Rule};
use takeoff_domain::Project;
use tracing::{debug, info};

/// Runs every enabled rule over a settled project
pub struct ComplianceEngine {
    config: ComplianceConfig,
    rules: Vec<Box<dyn Rule>>,
}

impl ComplianceEngine {
    /// Create an engine with the standard rule set
    pub fn new(config: ComplianceConfig) -> Result<Self, ComplianceError> {
        config.validate().map_err(ComplianceError::Config)?;
        Ok(Self {
            config,
            rules: standard_rules(),
        })
    }

    /// Create an engine with the default configuration
    pub fn default_config() -> Self {
        Self {
            config: ComplianceConfig::default(),
            rules: standard_rules(),
        }
    }

    /// Append a rule after the standard set
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    /// Evaluate the project
    ///
    /// Rules run in registration order; the report keeps their flags in that
    /// order. Disabled rules contribute nothing to the score.
    pub fn evaluate(&self, project: &Project) -> ComplianceReport {
        let mut flags = Vec::new();
        for rule in &self.rules {
            if !rule.enabled(&self.config) {
                debug!(rule = rule.name(), "Rule disabled");
                continue;
            }
            let raised = rule.evaluate(project, &self.config);
            debug!(rule = rule.name(), flags = raised.len(), "Rule evaluated");
            flags.extend(raised);
        }

        let report = ComplianceReport::from_flags(flags);
        info!(
            project = %project.name,
            checks = report.total_checks(),
            passed = report.passed,
            critical = report.failed,
            warnings = report.warnings,
            score = report.compliance_score,
            "Compliance evaluated"
        );
        report
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::default_config()
    }
}
