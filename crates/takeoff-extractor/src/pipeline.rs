//! Extraction pipeline
//!
//! Groups classified pages by drawing kind, asks the primary provider for one
//! payload per kind, merges each into the project and hands the result to the
//! [`EscalationController`]. Every failure is isolated to its kind and becomes
//! a run warning.

use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::escalation::{EscalationController, EscalationOutcome};
use crate::merge::{MergeEngine, MergeReport};
use crate::payload::{Payload, PayloadKind};
use crate::prompt::PromptBuilder;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use takeoff_domain::{
    ConfidenceBreakdown, ImageRef, Page, Project, RunId, ScoringConfig, VisionProvider,
};
use tracing::{debug, info, warn};

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRun {
    /// Run identifier
    pub run_id: RunId,
    /// Settled entity graph
    pub project: Project,
    /// Score after initial extraction
    pub initial_confidence: ConfidenceBreakdown,
    /// Score of the settled graph
    pub final_confidence: ConfidenceBreakdown,
    /// What the Escalation Controller did
    pub escalation: EscalationOutcome,
    /// Combined report of the initial merges
    pub merge_report: MergeReport,
    /// Isolated failures and merge ambiguities, in order
    pub warnings: Vec<String>,
    /// Tokens across all calls
    pub tokens_used: u64,
    /// Cost across all calls
    pub cost: f64,
    /// Unix seconds at start
    pub started_at: u64,
    /// Wall-clock duration
    pub processing_time_ms: u64,
    /// Model whose output the settled graph reflects
    pub model_used: String,
}

impl ExtractionRun {
    /// Final overall confidence
    pub fn confidence(&self) -> f64 {
        self.final_confidence.overall
    }

    /// Whether any page yielded data
    pub fn has_data(&self) -> bool {
        self.project.pages_with_data > 0
    }
}

/// Parse a raw response for one kind and merge it
///
/// Failures never propagate: an unparseable response yields a report with a
/// single warning and leaves the project unchanged.
pub fn ingest(kind: PayloadKind, response: &str, project: &mut Project) -> MergeReport {
    match Payload::from_response(kind, response) {
        Ok(payload) => MergeEngine::accumulate().merge(&payload, project),
        Err(e) => {
            let message = format!("{} response could not be read: {}", kind, e);
            warn!("{}", message);
            MergeReport {
                warnings: vec![message],
                ..Default::default()
            }
        }
    }
}

/// Drives extraction and escalation for one project
pub struct Pipeline<P, V = P> {
    primary: P,
    verifier: Option<V>,
    config: PipelineConfig,
    scoring: ScoringConfig,
}

impl<P> Pipeline<P, P>
where
    P: VisionProvider,
    P::Error: Display,
{
    /// Create a pipeline with no verification provider
    pub fn new(primary: P, config: PipelineConfig) -> Self {
        Self {
            primary,
            verifier: None,
            config,
            scoring: ScoringConfig::default(),
        }
    }

    /// Create a pipeline after validating the configuration
    pub fn try_new(primary: P, config: PipelineConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self::new(primary, config))
    }
}

impl<P, V> Pipeline<P, V>
where
    P: VisionProvider,
    P::Error: Display,
    V: VisionProvider,
    V::Error: Display,
{
    /// Use a separate provider for the verification pass
    pub fn with_verifier<W>(self, verifier: W) -> Pipeline<P, W>
    where
        W: VisionProvider,
        W::Error: Display,
    {
        Pipeline {
            primary: self.primary,
            verifier: Some(verifier),
            config: self.config,
            scoring: self.scoring,
        }
    }

    /// Override the scoring weights
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract every page into `project`, then score and escalate
    pub fn run(&self, project: Project, pages: &[Page]) -> ExtractionRun {
        let started = Instant::now();
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let run_id = RunId::new();

        info!(
            run_id = %run_id,
            pages = pages.len(),
            model = self.primary.model_name(),
            "Starting extraction run"
        );

        let mut project = project;
        project.pages_processed = u32::try_from(pages.len()).unwrap_or(u32::MAX);
        project.pages_with_data = 0;

        let mut warnings = Vec::new();
        let mut merge_report = MergeReport::default();
        let mut tokens_used = 0u64;
        let mut cost = 0.0;
        let block_names: Vec<String> = project
            .building_blocks
            .iter()
            .map(|b| b.name.clone())
            .collect();

        for kind in PayloadKind::ALL {
            let group: Vec<&Page> = pages
                .iter()
                .filter(|p| PayloadKind::for_page(p.page_type) == Some(kind))
                .collect();
            if group.is_empty() {
                continue;
            }

            let limit = self.config.page_limit(kind);
            let mut selected: Vec<&Page> = group
                .iter()
                .copied()
                .filter(|p| p.image.is_some())
                .take(limit)
                .collect();
            if selected.is_empty() {
                selected = group
                    .iter()
                    .copied()
                    .filter(|p| p.text.is_some())
                    .take(limit)
                    .collect();
            }
            if selected.is_empty() {
                let message = format!("{} pages carry no image or text; skipped", kind);
                warn!("{}", message);
                warnings.push(message);
                continue;
            }

            let images: Vec<ImageRef> = selected.iter().filter_map(|p| p.image.clone()).collect();
            let prompt = PromptBuilder::new(kind)
                .with_block_names(block_names.iter().cloned())
                .with_page_text(selected.iter().filter_map(|p| p.text.clone()))
                .build();

            debug!(kind = %kind, pages = group.len(), images = images.len(), "Calling provider");
            let output_tokens = self.config.output_tokens(kind);
            let response = match self.primary.call_vision(&images, &prompt, output_tokens) {
                Ok(response) => response,
                Err(e) => {
                    let message = format!("{} extraction failed: {}", kind, e);
                    warn!("{}", message);
                    warnings.push(message);
                    continue;
                }
            };
            tokens_used += response.tokens_used;
            cost += response.cost;

            let report = ingest(kind, &response.text, &mut project);
            if report.payload_entities > 0 {
                let pages = u32::try_from(group.len()).unwrap_or(u32::MAX);
                project.pages_with_data = project.pages_with_data.saturating_add(pages);
            }
            info!(
                kind = %kind,
                created = report.entities_created(),
                touched = report.entities_touched(),
                "Merged extraction"
            );
            warnings.extend(report.warnings.iter().cloned());
            merge_report.combine(report);
        }

        let verification_images: Vec<ImageRef> = pages
            .iter()
            .filter(|p| PayloadKind::for_page(p.page_type).is_some())
            .filter_map(|p| p.image.clone())
            .take(self.config.max_verification_pages)
            .collect();

        let escalation = EscalationController::new(self.verifier.as_ref(), &self.config)
            .with_images(verification_images)
            .with_scoring(self.scoring.clone())
            .run(&mut project);

        tokens_used += escalation.tokens_used;
        cost += escalation.cost;
        warnings.extend(escalation.warnings.iter().cloned());

        let model_used = match (&escalation.model_used, escalation.verified()) {
            (Some(model), true) => model.clone(),
            _ => self.primary.model_name().to_string(),
        };

        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            run_id = %run_id,
            confidence = escalation.confidence_after.overall,
            warnings = warnings.len(),
            processing_time_ms,
            "Extraction run settled"
        );

        ExtractionRun {
            run_id,
            project,
            initial_confidence: escalation.confidence_before,
            final_confidence: escalation.confidence_after,
            escalation,
            merge_report,
            warnings,
            tokens_used,
            cost,
            started_at,
            processing_time_ms,
            model_used,
        }
    }
}
