//! Log Module
//!
//! Append-only activity log. Writers (point accrual, gift redemption) append
//! on their own transaction; `LogService` only reads.

pub mod db;
pub mod service;

pub use service::LogService;
