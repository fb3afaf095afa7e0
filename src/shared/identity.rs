//! Caller Identity
//!
//! The verified identity of the user making a request. It is produced by the
//! session layer from a bearer credential and handed explicitly to every
//! service method that acts on behalf of a user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;

/// Verified caller identity resolved from a bearer credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Internal user id (primary key of the users table)
    pub id: Uuid,
    /// External identity key issued by the sign-in provider
    pub uid: String,
}

impl Identity {
    pub fn new(id: Uuid, uid: impl Into<String>) -> Self {
        Self { id, uid: uid.into() }
    }
}

/// Parse a client-supplied identifier, rejecting malformed input up front
///
/// Every lookup path goes through this before touching the store, so a bad
/// id is always a validation error and never a silent miss.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, SharedError> {
    Uuid::parse_str(raw.trim()).map_err(|_| SharedError::invalid_id(field, raw))
}
