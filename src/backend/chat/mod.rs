//! Chat Module
//!
//! Two-party message threads with push notification of the recipient.

pub mod db;
pub mod service;

pub use service::ChatService;
