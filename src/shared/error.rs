//! Shared Error Types
//!
//! This module defines error types raised by the plain data layer: request
//! validation and JSON handling. They carry no HTTP knowledge; the backend
//! wraps them in `BackendError` and maps them to a status code there.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Data validation failures (malformed ids, empty text)
//!
//! # Usage
//!
//! ```rust
//! use studyabout::shared::error::SharedError;
//!
//! let error = SharedError::validation("comment", "Comment cannot be empty");
//! ```
use thiserror::Error;

/// Errors raised while validating or (de)serializing shared data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Validation error for an identifier that does not parse
    pub fn invalid_id(field: impl Into<String>, raw: &str) -> Self {
        Self::validation(field, format!("'{}' is not a valid identifier", raw))
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
