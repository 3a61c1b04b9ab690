//! Review session: reviewer corrections applied to a settled project

use crate::error::Result;
use crate::log::{CorrectionEntry, CorrectionLog};
use crate::metrics::ReviewMetrics;
use crate::path::{resolve, FieldPath};
use serde_json::Value;
use takeoff_domain::{names_match, Project};
use tracing::{debug, info, warn};

/// Items the extraction produced, as counted for accuracy
///
/// Boards, circuits, rooms, non-zero fixture counts, equipment and site
/// cable runs each count once.
pub fn count_ai_items(project: &Project) -> usize {
    let blocks: usize = project
        .building_blocks
        .iter()
        .map(|block| {
            let boards = block.distribution_boards.len();
            let circuits: usize = block.distribution_boards.iter().map(|b| b.circuits.len()).sum();
            let rooms: usize = block
                .rooms
                .iter()
                .map(|r| 1 + r.fixtures.nonzero_entries())
                .sum();
            boards + circuits + rooms + block.heavy_equipment.len()
        })
        .sum();
    blocks + project.site_cable_runs.len()
}

/// Result of a finished review
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The corrected project
    pub project: Project,
    /// Every correction still in effect
    pub log: CorrectionLog,
    /// Session counters
    pub metrics: ReviewMetrics,
}

/// An applied correction and the value it replaced
#[derive(Debug, Clone)]
struct Applied {
    entry: CorrectionEntry,
    path: FieldPath,
    previous: Value,
}

/// Applies reviewer corrections to a project
///
/// Every applied correction pins its field as Manual, so later automated
/// merges leave it alone. Failed corrections leave the graph unchanged.
///
/// # Examples
///
/// ```no_run
/// use takeoff_domain::Project;
/// use takeoff_review::{CorrectionEntry, ReviewSession};
///
/// # fn main() -> takeoff_review::Result<()> {
/// let project = Project::with_blocks("Clubhouse", ["Pool"]);
/// let mut session = ReviewSession::new(project);
///
/// session.apply(
///     CorrectionEntry::new("blocks.Pool.rooms.Office.fixtures.downlight_led_6w", 12, "fixture_count")
///         .with_original(10),
/// )?;
/// let outcome = session.finish();
/// println!("accuracy {:.1}%", outcome.log.accuracy_pct());
/// # Ok(())
/// # }
/// ```
pub struct ReviewSession {
    project: Project,
    applied: Vec<Applied>,
    total_ai_items: usize,
    metrics: ReviewMetrics,
}

impl ReviewSession {
    /// Start reviewing a project
    pub fn new(project: Project) -> Self {
        let total_ai_items = count_ai_items(&project);
        Self {
            project,
            applied: Vec::new(),
            total_ai_items,
            metrics: ReviewMetrics::new(),
        }
    }

    /// The project as corrected so far
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &ReviewMetrics {
        &self.metrics
    }

    /// Items counted when the session started
    pub fn total_ai_items(&self) -> usize {
        self.total_ai_items
    }

    /// Number of corrections in effect
    pub fn num_corrections(&self) -> usize {
        self.applied.len()
    }

    /// Whether any correction is in effect
    pub fn has_corrections(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Apply a correction and pin the field as Manual
    ///
    /// A null `original_value` is filled from the graph and an empty
    /// `building_block` from the path. On error nothing is changed.
    pub fn apply(&mut self, entry: CorrectionEntry) -> Result<&CorrectionEntry> {
        let had_parameters = self.project.system_parameters.is_some();
        if let Err(e) = self.try_apply(entry) {
            // resolve() creates system parameters before the field is checked
            if !had_parameters {
                self.project.system_parameters = None;
            }
            warn!(error = %e, "Correction rejected");
            self.metrics.record_rejected();
            return Err(e);
        }
        Ok(&self.applied[self.applied.len() - 1].entry)
    }

    fn try_apply(&mut self, mut entry: CorrectionEntry) -> Result<()> {
        let path = FieldPath::parse(&entry.field_path)?;
        let slot = resolve(&mut self.project, &path)?;
        let typed = slot.convert(&entry.corrected_value, &entry.field_path)?;
        let previous = slot.current();
        slot.pin(typed);

        if entry.original_value.is_null() {
            entry.original_value = previous.clone();
        }
        if entry.building_block.is_empty() {
            if let Some(block) = path.block() {
                entry.building_block = block.to_string();
            }
        }
        debug!(
            path = %path,
            from = %previous,
            to = %entry.corrected_value,
            "Correction applied"
        );
        self.metrics.record_applied(&entry.item_type);
        self.applied.push(Applied {
            entry,
            path,
            previous,
        });
        Ok(())
    }

    /// Apply several corrections, stopping at the first failure
    pub fn apply_all(&mut self, entries: impl IntoIterator<Item = CorrectionEntry>) -> Result<usize> {
        let mut count = 0;
        for entry in entries {
            self.apply(entry)?;
            count += 1;
        }
        Ok(count)
    }

    /// Revert the last correction
    ///
    /// The field gets back the value it held before the correction and stays
    /// Manual. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<CorrectionEntry>> {
        let Some(last) = self.applied.pop() else {
            return Ok(None);
        };
        let slot = resolve(&mut self.project, &last.path)?;
        let typed = slot.convert(&last.previous, &last.entry.field_path)?;
        slot.pin(typed);

        debug!(path = %last.path, to = %last.previous, "Correction undone");
        self.metrics.record_undone(&last.entry.item_type);
        Ok(Some(last.entry))
    }

    /// Corrections in a block
    pub fn corrections_for_block(&self, block: &str) -> Vec<&CorrectionEntry> {
        self.applied
            .iter()
            .map(|a| &a.entry)
            .filter(|e| names_match(&e.building_block, block))
            .collect()
    }

    /// Corrections of one item type
    pub fn corrections_by_type(&self, item_type: &str) -> Vec<&CorrectionEntry> {
        self.applied
            .iter()
            .map(|a| &a.entry)
            .filter(|e| e.item_type == item_type)
            .collect()
    }

    /// Correction log as it stands
    pub fn correction_log(&self) -> CorrectionLog {
        CorrectionLog::new(
            self.project.name.clone(),
            self.applied.iter().map(|a| a.entry.clone()).collect(),
            self.total_ai_items,
        )
    }

    /// Accuracy if the review ended now
    pub fn accuracy_preview(&self) -> f64 {
        self.correction_log().accuracy_pct()
    }

    /// End the review
    pub fn finish(self) -> ReviewOutcome {
        let log = self.correction_log();
        info!(
            project = %self.project.name,
            corrections = log.len(),
            accuracy = log.accuracy_pct(),
            "Review complete"
        );
        ReviewOutcome {
            project: self.project,
            log,
            metrics: self.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReviewError;
    use serde_json::json;
    use takeoff_domain::{Circuit, Confidence, DistributionBoard, Room, SiteCableRun, Tracked};

    fn project() -> Project {
        let mut project = Project::with_blocks("Clubhouse", ["Pool"]);
        let block = &mut project.building_blocks[0];

        let mut board = DistributionBoard::new("DB-P");
        board.main_breaker_a = Tracked::new(60, Confidence::Extracted);
        board.circuits.push(Circuit::new("L1"));
        board.circuits.push(Circuit::new("P1"));
        block.distribution_boards.push(board);

        let mut office = Room::new("Office");
        office
            .fixtures
            .absorb("downlight_led_6w", Some(10), Confidence::Extracted);
        office
            .fixtures
            .absorb("double_socket_300", Some(4), Confidence::Extracted);
        block.rooms.push(office);

        project.site_cable_runs.push(SiteCableRun::new("Kiosk", "DB-P"));
        project
    }

    #[test]
    fn test_ai_item_count() {
        // board, two circuits, room, two fixtures, cable run
        assert_eq!(count_ai_items(&project()), 7);
    }

    #[test]
    fn test_apply_pins_manual_and_fills_context() {
        let mut session = ReviewSession::new(project());
        let entry = session
            .apply(CorrectionEntry::new(
                "blocks.pool.rooms.office.fixtures.downlight_led_6w",
                12,
                "fixture_count",
            ))
            .unwrap();
        assert_eq!(entry.original_value, json!(10));
        assert_eq!(entry.building_block, "pool");

        let room = session.project().block("Pool").unwrap().room("Office").unwrap();
        assert_eq!(room.fixtures.get("downlight_led_6w"), 12);
        assert!(room.fixtures.entry("downlight_led_6w").unwrap().is_manual());
        assert_eq!(session.corrections_for_block("POOL").len(), 1);
    }

    #[test]
    fn test_rejected_correction_changes_nothing() {
        let mut session = ReviewSession::new(project());
        let before = session.project().clone();

        let wrong_type = CorrectionEntry::new("blocks.Pool.boards.DB-P.main_breaker_a", "63A", "breaker_rating");
        assert!(matches!(session.apply(wrong_type), Err(ReviewError::TypeMismatch { .. })));
        let missing = CorrectionEntry::new("blocks.Pool.rooms.Kitchen.area_m2", 12.0, "area");
        assert!(matches!(session.apply(missing), Err(ReviewError::NotFound { .. })));

        assert_eq!(session.project(), &before);
        assert_eq!(session.metrics().rejected, 2);
        assert!(!session.has_corrections());
    }

    #[test]
    fn test_undo_restores_value_but_stays_manual() {
        let mut session = ReviewSession::new(project());
        session
            .apply(CorrectionEntry::new("blocks.Pool.boards.DB-P.main_breaker_a", 63, "breaker_rating"))
            .unwrap();
        let undone = session.undo().unwrap().unwrap();
        assert_eq!(undone.corrected_value, json!(63));

        let board = session.project().block("Pool").unwrap().board("DB-P").unwrap();
        assert_eq!(board.main_breaker_a.value, 60);
        assert!(board.main_breaker_a.is_manual());
        assert!(session.undo().unwrap().is_none());
        assert_eq!(session.metrics().net_applied(), 0);
    }

    #[test]
    fn test_correction_log_and_accuracy() {
        let mut session = ReviewSession::new(project());
        session
            .apply_all([
                CorrectionEntry::new("blocks.Pool.rooms.Office.fixtures.downlight_led_6w", 12, "fixture_count"),
                CorrectionEntry::new("blocks.Pool.rooms.Office.fixtures.isolator_30a", 1, "fixture_count"),
                CorrectionEntry::new("blocks.Pool.rooms.Office.fixtures.double_socket_300", 0, "fixture_count"),
                CorrectionEntry::new("site_cable_runs.0.length_m", 85.0, "cable_length"),
            ])
            .unwrap();

        assert_eq!(session.corrections_by_type("fixture_count").len(), 3);
        let log = session.correction_log();
        assert_eq!(log.total_corrected, 1);
        assert_eq!(log.total_added, 2);
        assert_eq!(log.total_removed, 1);
        // 7 items, 2 changed or removed
        assert_eq!(log.accuracy_pct(), 71.4);

        let outcome = session.finish();
        assert_eq!(outcome.log.len(), 4);
        assert_eq!(outcome.metrics.applied, 4);
        assert!(outcome.project.site_cable_runs[0].length_m.is_manual());
    }

    #[test]
    fn test_system_parameters_created_on_demand() {
        let mut session = ReviewSession::new(Project::new("p"));
        session
            .apply(CorrectionEntry::new("system_parameters.earthing_system", "TN-C-S", "parameter"))
            .unwrap();
        let params = session.project().system_parameters.as_ref().unwrap();
        assert_eq!(params.earthing_system.value, "TN-C-S");
        assert!(params.earthing_system.is_manual());
    }

    #[test]
    fn test_rejected_system_parameter_leaves_none() {
        let mut session = ReviewSession::new(Project::with_blocks("p", ["Main House"]));
        let before = session.project().clone();

        let unknown = CorrectionEntry::new("system_parameters.bogus", 1, "parameter");
        assert!(matches!(session.apply(unknown), Err(ReviewError::UnknownField { .. })));
        let wrong_type = CorrectionEntry::new("system_parameters.frequency_hz", "50Hz", "parameter");
        assert!(matches!(session.apply(wrong_type), Err(ReviewError::TypeMismatch { .. })));

        assert_eq!(session.project(), &before);
        assert!(session.project().system_parameters.is_none());
    }

    #[test]
    fn test_rejected_system_parameter_keeps_existing_values() {
        let mut session = ReviewSession::new(Project::new("p"));
        session
            .apply(CorrectionEntry::new("system_parameters.phase", "3", "parameter"))
            .unwrap();
        let before = session.project().clone();

        assert!(session
            .apply(CorrectionEntry::new("system_parameters.bogus", 1, "parameter"))
            .is_err());
        assert_eq!(session.project(), &before);
    }
}
