//! Common test utilities and helpers
//!
//! - Database fixture (in-memory SQLite with migrations)
//! - User and identity helpers
//! - Recording push backend

#![allow(dead_code)]

pub mod auth_helpers;
pub mod database;
pub mod mock_push;

pub use auth_helpers::*;
pub use database::*;
pub use mock_push::*;
