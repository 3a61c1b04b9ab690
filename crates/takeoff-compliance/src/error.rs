//! Compliance error types

use thiserror::Error;

/// Errors that can occur while setting up or exporting compliance checks
#[derive(Error, Debug)]
pub enum ComplianceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ComplianceError {
    fn from(e: serde_json::Error) -> Self {
        ComplianceError::Serialization(e.to_string())
    }
}
