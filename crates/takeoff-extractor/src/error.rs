//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while turning provider output into graph updates
///
/// The pipeline itself never returns these for provider or parse failures;
/// those become run warnings. They surface from the lower-level helpers
/// (`parse_response`, `Payload::from_value`) and from configuration.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Vision provider call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Response text is not a JSON object
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// JSON is well-formed but does not fit the payload schema
    #[error("Payload schema error for {kind}: {message}")]
    Schema {
        /// Payload kind being decoded
        kind: String,
        /// Decoder message
        message: String,
    },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
