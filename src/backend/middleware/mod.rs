//! Middleware Module
//!
//! Request-side plumbing the route layer plugs in front of the services.
//!
//! - **`auth`** - bearer token extractor producing the caller identity

pub mod auth;

pub use auth::{bearer_token, AuthUser};
