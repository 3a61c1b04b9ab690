//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider could not be built or called
    #[error("Provider error: {0}")]
    Provider(#[from] takeoff_llm::LlmError),

    /// Extraction setup error
    #[error("Extraction error: {0}")]
    Extractor(#[from] takeoff_extractor::ExtractorError),

    /// Compliance setup error
    #[error("Compliance error: {0}")]
    Compliance(#[from] takeoff_compliance::ComplianceError),

    /// Correction could not be applied
    #[error("Review error: {0}")]
    Review(#[from] takeoff_review::ReviewError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `check --deny-critical` found critical failures
    #[error("{0} critical compliance issue(s)")]
    CriticalIssues(usize),
}
