//! Register Module
//!
//! Sign-up forms and their approval.

pub mod db;
pub mod service;

pub use service::RegisterService;
