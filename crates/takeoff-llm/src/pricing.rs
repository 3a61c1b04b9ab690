//! Token pricing

use serde::{Deserialize, Serialize};

/// Per-million-token rates for a model
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    /// Cost per million input tokens
    #[serde(default)]
    pub input_per_mtok: f64,
    /// Cost per million output tokens
    #[serde(default)]
    pub output_per_mtok: f64,
}

impl Pricing {
    /// Create a rate card
    pub fn new(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }

    /// Cost of a call with the given token usage
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_mtok + output_tokens as f64 * self.output_per_mtok)
            / 1_000_000.0
    }
}
