//! Correction entries and the correction log

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in seconds since Unix epoch
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Whether a value counts as "nothing" for added/removed tallies
///
/// Empty means 0, null, an empty string, an empty list or `false`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(_) => false,
    }
}

/// One reviewer correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    /// Dot-delimited path to the corrected field
    pub field_path: String,
    /// Value before the correction; filled from the graph when left null
    #[serde(default)]
    pub original_value: Value,
    /// Value the reviewer set
    pub corrected_value: Value,
    /// Kind of item, e.g. "fixture_count" or "breaker_rating"
    #[serde(default)]
    pub item_type: String,
    /// Block the field belongs to; filled from the path when empty
    #[serde(default)]
    pub building_block: String,
    /// Drawing page the value came from
    #[serde(default)]
    pub page_source: String,
    /// Seconds since the Unix epoch
    #[serde(default = "current_timestamp")]
    pub timestamp: u64,
}

impl CorrectionEntry {
    /// Create a correction stamped with the current time
    pub fn new(
        field_path: impl Into<String>,
        corrected_value: impl Into<Value>,
        item_type: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            original_value: Value::Null,
            corrected_value: corrected_value.into(),
            item_type: item_type.into(),
            building_block: String::new(),
            page_source: String::new(),
            timestamp: current_timestamp(),
        }
    }

    /// Set the value the reviewer saw
    pub fn with_original(mut self, value: impl Into<Value>) -> Self {
        self.original_value = value.into();
        self
    }

    /// Set the source page
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page_source = page.into();
        self
    }

    /// Empty before, something after
    pub fn is_addition(&self) -> bool {
        is_empty_value(&self.original_value) && !is_empty_value(&self.corrected_value)
    }

    /// Something before, empty after
    pub fn is_removal(&self) -> bool {
        !is_empty_value(&self.original_value) && is_empty_value(&self.corrected_value)
    }
}

/// All corrections from one review, with accuracy tallies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrectionLog {
    /// Project the review covered
    pub project_name: String,
    /// Corrections in the order applied
    pub corrections: Vec<CorrectionEntry>,
    /// Items the extraction produced
    pub total_ai_items: usize,
    /// Corrections that changed one value to another
    pub total_corrected: usize,
    /// Corrections that filled an empty value
    pub total_added: usize,
    /// Corrections that emptied a value
    pub total_removed: usize,
}

impl CorrectionLog {
    /// Tally a list of corrections
    pub fn new(
        project_name: impl Into<String>,
        corrections: Vec<CorrectionEntry>,
        total_ai_items: usize,
    ) -> Self {
        let total_added = corrections.iter().filter(|c| c.is_addition()).count();
        let total_removed = corrections.iter().filter(|c| c.is_removal()).count();
        let total_corrected = corrections.len() - total_added - total_removed;
        Self {
            project_name: project_name.into(),
            corrections,
            total_ai_items,
            total_corrected,
            total_added,
            total_removed,
        }
    }

    /// Number of corrections
    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    /// Whether no corrections were made
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    /// Share of extracted items left untouched, in percent to one decimal
    pub fn accuracy_pct(&self) -> f64 {
        if self.total_ai_items == 0 {
            return 0.0;
        }
        let correct = self
            .total_ai_items
            .saturating_sub(self.total_corrected + self.total_removed);
        let pct = correct as f64 / self.total_ai_items as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }
}
