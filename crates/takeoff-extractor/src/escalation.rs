//! Escalation Controller
//!
//! Decides whether a settled-looking graph needs a verification pass and runs
//! at most one.
//!
//! ```text
//! Initial ──(score ≥ threshold)──────────────────────────────► Settled
//!    │
//!    └─(score < threshold)─► Verifying ─(applied)─────────────► Settled
//!                                │
//!                                └─(call or decode failed)─► VerificationFailed ─► Settled
//! ```
//!
//! [`EscalationController::run`] consumes the controller, so a second attempt
//! cannot be made with the same one. A failed verification leaves the graph
//! exactly as it was and records a single warning.

use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::merge::{MergeEngine, MergeReport};
use crate::parser::parse_response;
use crate::payload::{Payload, PayloadKind};
use crate::prompt::verification_prompt;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use takeoff_domain::{
    score_project, ConfidenceBreakdown, ImageRef, Project, ScoringConfig, VisionProvider,
};
use tracing::{debug, info, warn};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    /// Scored, not yet decided
    Initial,
    /// Verification call in flight
    Verifying,
    /// Final
    Settled,
    /// Verification failed; the pre-verification graph is kept
    VerificationFailed,
}

impl EscalationState {
    /// Get the state as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationState::Initial => "initial",
            EscalationState::Verifying => "verifying",
            EscalationState::Settled => "settled",
            EscalationState::VerificationFailed => "verification_failed",
        }
    }
}

impl fmt::Display for EscalationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the controller did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationOutcome {
    /// States visited, in order
    pub path: Vec<EscalationState>,
    /// Score before any verification
    pub confidence_before: ConfidenceBreakdown,
    /// Score of the settled graph
    pub confidence_after: ConfidenceBreakdown,
    /// Verification model, when a call was made
    pub model_used: Option<String>,
    /// Tokens spent on verification
    pub tokens_used: u64,
    /// Cost of verification
    pub cost: f64,
    /// What the verification merge changed
    pub merge_report: Option<MergeReport>,
    /// Failure notes and merge ambiguities
    pub warnings: Vec<String>,
}

impl EscalationOutcome {
    fn new(before: ConfidenceBreakdown) -> Self {
        Self {
            path: vec![EscalationState::Initial],
            confidence_before: before,
            confidence_after: before,
            model_used: None,
            tokens_used: 0,
            cost: 0.0,
            merge_report: None,
            warnings: Vec::new(),
        }
    }

    /// Whether a verification call was attempted
    pub fn attempted(&self) -> bool {
        self.path.contains(&EscalationState::Verifying)
    }

    /// Whether verification ran and was applied
    pub fn verified(&self) -> bool {
        self.attempted() && !self.path.contains(&EscalationState::VerificationFailed)
    }

    /// Last state reached
    pub fn final_state(&self) -> EscalationState {
        self.path
            .last()
            .copied()
            .unwrap_or(EscalationState::Initial)
    }
}

/// Runs the single bounded verification pass
pub struct EscalationController<V> {
    verifier: Option<V>,
    threshold: f64,
    enabled: bool,
    max_output_tokens: u32,
    images: Vec<ImageRef>,
    scoring: ScoringConfig,
    state: EscalationState,
}

impl<V> EscalationController<V>
where
    V: VisionProvider,
    V::Error: Display,
{
    /// Create a controller; with no verifier, low scores settle unverified
    pub fn new(verifier: Option<V>, config: &PipelineConfig) -> Self {
        Self {
            verifier,
            threshold: config.escalation_threshold,
            enabled: config.escalation_enabled,
            max_output_tokens: config.verification_max_output_tokens,
            images: Vec::new(),
            scoring: ScoringConfig::default(),
            state: EscalationState::Initial,
        }
    }

    /// Source page images sent with the verification request
    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }

    /// Override the scoring weights
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Current state
    pub fn state(&self) -> EscalationState {
        self.state
    }

    /// Score the graph and verify it once if it falls below the threshold
    pub fn run(mut self, project: &mut Project) -> EscalationOutcome {
        let before = score_project(project, &self.scoring);
        let mut outcome = EscalationOutcome::new(before);

        if !self.enabled || !before.is_below(self.threshold) {
            debug!(confidence = before.overall, "No escalation needed");
            self.transition(&mut outcome, EscalationState::Settled);
            return outcome;
        }

        let Some(verifier) = self.verifier.take() else {
            info!(
                confidence = before.overall,
                threshold = self.threshold,
                "Low confidence but no verification provider configured"
            );
            self.transition(&mut outcome, EscalationState::Settled);
            return outcome;
        };

        info!(
            confidence = before.overall,
            threshold = self.threshold,
            model = verifier.model_name(),
            "Low confidence, escalating to verification"
        );
        self.transition(&mut outcome, EscalationState::Verifying);
        outcome.model_used = Some(verifier.model_name().to_string());

        match self.verify(&verifier, project, &mut outcome) {
            Ok(payloads) => {
                let engine = MergeEngine::replace();
                let mut report = MergeReport::default();
                for payload in &payloads {
                    report.combine(engine.merge(payload, project));
                }
                outcome.warnings.extend(report.warnings.iter().cloned());
                outcome.merge_report = Some(report);
                outcome.confidence_after = score_project(project, &self.scoring);
                info!(
                    before = before.overall,
                    after = outcome.confidence_after.overall,
                    "Verification applied"
                );
            }
            Err(e) => {
                let message = format!("Verification failed; keeping pre-verification graph: {}", e);
                warn!("{}", message);
                outcome.warnings.push(message);
                self.transition(&mut outcome, EscalationState::VerificationFailed);
            }
        }

        self.transition(&mut outcome, EscalationState::Settled);
        outcome
    }

    /// Call the verifier and decode every section before anything is applied
    fn verify(
        &self,
        verifier: &V,
        project: &Project,
        outcome: &mut EscalationOutcome,
    ) -> Result<Vec<Payload>, ExtractorError> {
        let prompt = verification_prompt(project)?;
        let response = verifier
            .call_vision(&self.images, &prompt, self.max_output_tokens)
            .map_err(|e| ExtractorError::Provider(e.to_string()))?;
        outcome.tokens_used += response.tokens_used;
        outcome.cost += response.cost;

        decode_sections(&response.text)
    }

    fn transition(&mut self, outcome: &mut EscalationOutcome, next: EscalationState) {
        debug!(from = ?self.state, to = ?next, "Escalation transition");
        self.state = next;
        outcome.path.push(next);
    }
}

/// Decode a verification response into per-kind payloads, in kind order
///
/// Sections are keyed by kind label (`sld`, `lighting`, `plugs`, `combined`,
/// `site`). A `null` section is ignored; any section that fails to decode
/// fails the whole response.
pub fn decode_sections(response: &str) -> Result<Vec<Payload>, ExtractorError> {
    let sections = parse_response(response)?;
    let mut payloads = Vec::new();

    for (key, value) in sections {
        let Some(kind) = PayloadKind::parse(&key) else {
            debug!(section = %key, "Ignoring unknown verification section");
            continue;
        };
        if value.is_null() {
            continue;
        }
        payloads.push(Payload::from_value(kind, value)?);
    }

    payloads.sort_by_key(|p| p.kind());
    Ok(payloads)
}
