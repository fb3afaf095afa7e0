//! Shared Module
//!
//! Plain data types of the service layer: what is stored, what callers send,
//! and what they get back as JSON. Nothing here touches the store or the
//! network, so the pure rules (like display, chat ordering, vote recipient
//! partitioning) live next to the types they operate on.

/// Verified caller identity and id parsing
pub mod identity;

/// Shared error types
pub mod error;

/// Users and their public projection
pub mod user;

/// Feeds, comments and like display
pub mod feed;

/// Two-party chat threads
pub mod chat;

/// Push registrations and payloads
pub mod notification;

/// Study groups and daily votes
pub mod study;

/// Gift draw entries
pub mod gift;

/// Activity log entries
pub mod log;

/// Sign-up forms awaiting approval
pub mod register;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use identity::{parse_id, Identity};
pub use user::{User, UserSummary};
