//! Error types for review operations

use thiserror::Error;

/// Errors that can occur while applying or undoing corrections
#[derive(Error, Debug)]
pub enum ReviewError {
    /// The path does not follow the correction path grammar
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath {
        /// Path as given
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// The path names an entity that is not in the project
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Entity kind, e.g. "board"
        kind: &'static str,
        /// Name or index as given
        name: String,
    },

    /// The entity has no correctable field by that name
    #[error("Unknown field '{field}' on {kind}")]
    UnknownField {
        /// Entity kind
        kind: &'static str,
        /// Field name as given
        field: String,
    },

    /// The corrected value has the wrong JSON type for the field
    #[error("Type mismatch at '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        /// Path being corrected
        path: String,
        /// Expected value type
        expected: &'static str,
        /// Value as given
        found: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ReviewError {
    fn from(e: serde_json::Error) -> Self {
        ReviewError::Serialization(e.to_string())
    }
}

/// Result type for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;
