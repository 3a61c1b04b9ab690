//! Confidence scoring
//!
//! Aggregate trust in a project graph is a weighted blend of two signals:
//!
//! 1. Completeness: the share of processed pages that yielded data
//! 2. Item confidence: the mean tier weight over scored items
//!
//! Scored items are every board, every non-spare circuit, every room and every
//! site cable run. With no scored items the item confidence defaults to 0.5.
//! A project with no processed pages always scores 0.

use crate::project::Project;
use serde::{Deserialize, Serialize};

/// Confidence below which a verification pass is triggered
pub const ESCALATION_THRESHOLD: f64 = 0.80;

/// Item confidence used when nothing is scorable
pub const DEFAULT_ITEM_CONFIDENCE: f64 = 0.5;

/// Weight of page completeness in the overall score
pub const COMPLETENESS_WEIGHT: f64 = 0.3;

/// Weight of item confidence in the overall score
pub const ITEM_WEIGHT: f64 = 0.7;

/// Configuration for confidence scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of completeness
    pub completeness_weight: f64,
    /// Weight of item confidence
    pub item_weight: f64,
    /// Item confidence when no items exist
    pub default_item_confidence: f64,
    /// Escalation trigger
    pub escalation_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            completeness_weight: COMPLETENESS_WEIGHT,
            item_weight: ITEM_WEIGHT,
            default_item_confidence: DEFAULT_ITEM_CONFIDENCE,
            escalation_threshold: ESCALATION_THRESHOLD,
        }
    }
}

/// Result of scoring a project
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// pages_with_data / pages_processed
    pub completeness: f64,
    /// Mean tier weight over scored items
    pub item_confidence: f64,
    /// Number of scored items
    pub scored_items: usize,
    /// Blended score in [0, 1]
    pub overall: f64,
}

impl ConfidenceBreakdown {
    /// Whether the overall score is below the threshold
    pub fn is_below(&self, threshold: f64) -> bool {
        self.overall < threshold
    }
}

/// Mean tier weight over the scored items, and how many there were
pub fn item_confidence(project: &Project, default: f64) -> (f64, usize) {
    let mut total = 0.0;
    let mut count = 0usize;

    for block in &project.building_blocks {
        for board in &block.distribution_boards {
            total += board.confidence.weight();
            count += 1;
            for circuit in board.active_circuits() {
                total += circuit.confidence.weight();
                count += 1;
            }
        }
        for room in &block.rooms {
            total += room.confidence.weight();
            count += 1;
        }
    }
    for run in &project.site_cable_runs {
        total += run.confidence.weight();
        count += 1;
    }

    if count == 0 {
        (default, 0)
    } else {
        (total / count as f64, count)
    }
}

/// Score a project
pub fn score_project(project: &Project, config: &ScoringConfig) -> ConfidenceBreakdown {
    let (item_confidence, scored_items) = item_confidence(project, config.default_item_confidence);

    if project.pages_processed == 0 {
        return ConfidenceBreakdown {
            completeness: 0.0,
            item_confidence,
            scored_items,
            overall: 0.0,
        };
    }

    let completeness = project.completeness();
    let overall = (config.completeness_weight * completeness + config.item_weight * item_confidence)
        .clamp(0.0, 1.0);

    ConfidenceBreakdown {
        completeness,
        item_confidence,
        scored_items,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Circuit, DistributionBoard};
    use crate::confidence::Confidence;
    use crate::project::BuildingBlock;
    use crate::room::Room;
    use crate::site::SiteCableRun;
    use crate::tracked::Tracked;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_pages_scores_zero() {
        let mut project = Project::new("x");
        let mut block = BuildingBlock::new("A");
        let mut board = DistributionBoard::new("DB-1");
        board.confidence = Confidence::Extracted;
        block.distribution_boards.push(board);
        project.building_blocks.push(block);

        let score = score_project(&project, &ScoringConfig::default());
        assert_eq!(score.overall, 0.0);
        assert_eq!(score.item_confidence, 1.0);
    }

    #[test]
    fn test_empty_graph_uses_default_item_confidence() {
        let mut project = Project::new("x");
        project.pages_processed = 2;
        project.pages_with_data = 1;

        let score = score_project(&project, &ScoringConfig::default());
        assert_eq!(score.scored_items, 0);
        assert!(approx(score.overall, 0.3 * 0.5 + 0.7 * 0.5));
    }

    #[test]
    fn test_spare_circuits_not_scored() {
        let mut project = Project::new("x");
        project.pages_processed = 1;
        project.pages_with_data = 1;

        let mut board = DistributionBoard::new("DB-1");
        board.confidence = Confidence::Extracted;
        let mut live = Circuit::new("L1");
        live.confidence = Confidence::Estimated;
        let mut spare = Circuit::new("S1");
        spare.is_spare = Tracked::new(true, Confidence::Extracted);
        board.circuits.push(live);
        board.circuits.push(spare);

        let mut block = BuildingBlock::new("A");
        block.distribution_boards.push(board);
        let mut room = Room::new("Office");
        room.confidence = Confidence::Inferred;
        block.rooms.push(room);
        project.building_blocks.push(block);

        let mut run = SiteCableRun::new("Kiosk", "DB-1");
        run.confidence = Confidence::Manual;
        project.site_cable_runs.push(run);

        let score = score_project(&project, &ScoringConfig::default());
        assert_eq!(score.scored_items, 4);
        let expected_items = (1.0 + 0.3 + 0.9 + 1.0) / 4.0;
        assert!(approx(score.item_confidence, expected_items));
        assert!(approx(score.overall, 0.3 + 0.7 * expected_items));
        assert!(score.is_below(ESCALATION_THRESHOLD) == (score.overall < 0.8));
    }

    #[test]
    fn test_overall_clamped() {
        let mut project = Project::new("x");
        project.pages_processed = 1;
        project.pages_with_data = 1;
        let config = ScoringConfig {
            completeness_weight: 2.0,
            item_weight: 2.0,
            ..ScoringConfig::default()
        };
        assert_eq!(score_project(&project, &config).overall, 1.0);
    }
}
