/**
 * Backend Error Types
 *
 * This module defines the error type every service operation returns.
 * Services are called with an already verified identity and report failures
 * through these variants; the HTTP layer maps them to status codes.
 *
 * # Error Categories
 *
 * ## Caller Errors
 *
 * - `Unauthorized` - no or invalid credentials
 * - `Forbidden` - the caller may not touch this record
 * - `NotFound` - a referenced feed, comment, user or registration is absent
 * - `Conflict` - the request clashes with current state (not enough points,
 *   registration already approved)
 * - `SharedError` - validation failures from the data layer
 *
 * ## Infrastructure Errors
 *
 * - `Database` - store failures, surfaced unchanged
 * - `Migration` - schema setup failures at startup
 * - `Serialization` - JSON columns that do not decode
 * - `Io` - image storage failures
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use studyabout::backend::error::BackendError;
///
/// let err = BackendError::not_found("feed", "3f1c...");
/// let err = BackendError::forbidden("Only the author can edit this comment");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// The caller is authenticated but may not perform this action
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// A referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier as the caller supplied it
        id: String,
    },

    /// The request conflicts with the current state
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (validation, malformed identifiers)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while storing uploads
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Create a new unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    ///
    /// # Arguments
    ///
    /// * `entity` - Kind of record, e.g. `"feed"`
    /// * `id` - The identifier that was looked up
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SharedError(SharedError::validation(field, message))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::SharedError(SharedError::ValidationError { .. }) => StatusCode::BAD_REQUEST,
            Self::SharedError(SharedError::SerializationError { .. }) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Migration(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A human-readable error message
    ///
    /// Infrastructure errors are reduced to a generic message so store
    /// details do not leak to clients; the full error is logged instead.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Conflict { message } => message.clone(),
            Self::NotFound { .. } | Self::SharedError(_) => self.to_string(),
            Self::Database(_) | Self::Migration(_) | Self::Io(_) | Self::Serialization(_) => {
                "Internal server error".to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
