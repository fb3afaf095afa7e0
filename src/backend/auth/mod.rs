//! Authentication Module
//!
//! Resolves bearer credentials into a caller `Identity`. Sign-in itself
//! happens at an external provider; this crate only issues and verifies the
//! session token that carries the resulting identity.

/// JWT session tokens
pub mod sessions;

pub use sessions::{create_token, verify_token, Claims, SessionKeys};
