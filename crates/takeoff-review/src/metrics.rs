//! Counters for a review session

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened during a review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewMetrics {
    /// Corrections applied
    pub applied: usize,

    /// Corrections undone
    pub undone: usize,

    /// Corrections rejected (bad path, missing entity, wrong type)
    pub rejected: usize,

    /// Applied corrections per item type
    pub by_type: BTreeMap<String, usize>,
}

impl ReviewMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an applied correction
    pub fn record_applied(&mut self, item_type: &str) {
        self.applied += 1;
        *self.by_type.entry(item_type.to_string()).or_insert(0) += 1;
    }

    /// Record an undo
    pub fn record_undone(&mut self, item_type: &str) {
        self.undone += 1;
        if let Some(count) = self.by_type.get_mut(item_type) {
            *count = count.saturating_sub(1);
        }
    }

    /// Record a rejected correction
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Corrections still in effect
    pub fn net_applied(&self) -> usize {
        self.applied.saturating_sub(self.undone)
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Review Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Applied: {}", self.applied),
            format!("Undone: {}", self.undone),
            format!("Rejected: {}", self.rejected),
        ];

        let by_type: Vec<_> = self.by_type.iter().filter(|(_, n)| **n > 0).collect();
        if !by_type.is_empty() {
            lines.push(String::new());
            lines.push("Corrections by type:".to_string());
            for (item_type, count) in by_type {
                let label = if item_type.is_empty() { "(untyped)" } else { item_type.as_str() };
                lines.push(format!("  {}: {}", label, count));
            }
        }

        lines.join("\n")
    }
}
