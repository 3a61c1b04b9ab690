//! Confidence module - provenance tiers for extracted values

use serde::{Deserialize, Serialize};

/// Provenance tier attached to every extracted value
///
/// Tiers describe how a value was obtained:
/// - Extracted: read directly off a drawing
/// - Inferred: calculated from other extracted values
/// - Estimated: guessed, or no provenance was supplied
/// - Manual: corrected by a human reviewer
///
/// Manual and Extracted both denote maximal trust. Manual additionally pins the
/// value: automated merges never overwrite a Manual field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Guessed or unlabelled
    #[default]
    Estimated,

    /// Calculated from other values
    Inferred,

    /// Read directly from the drawing
    Extracted,

    /// Corrected by a reviewer
    Manual,
}

impl Confidence {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Estimated => "estimated",
            Confidence::Inferred => "inferred",
            Confidence::Extracted => "extracted",
            Confidence::Manual => "manual",
        }
    }

    /// Parse a tier label leniently
    ///
    /// Labels are matched case-insensitively; anything unrecognised is treated as
    /// Estimated rather than rejected.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "extracted" => Confidence::Extracted,
            "inferred" => Confidence::Inferred,
            "manual" => Confidence::Manual,
            _ => Confidence::Estimated,
        }
    }

    /// Scoring weight used by the confidence scorer
    pub fn weight(&self) -> f64 {
        match self {
            Confidence::Extracted | Confidence::Manual => 1.0,
            Confidence::Inferred => 0.9,
            Confidence::Estimated => 0.3,
        }
    }

    /// Whether the value is pinned by a human correction
    pub fn is_manual(&self) -> bool {
        matches!(self, Confidence::Manual)
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extracted" => Ok(Confidence::Extracted),
            "inferred" => Ok(Confidence::Inferred),
            "estimated" => Ok(Confidence::Estimated),
            "manual" => Ok(Confidence::Manual),
            _ => Err(format!("Invalid confidence tier: {}", s)),
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
