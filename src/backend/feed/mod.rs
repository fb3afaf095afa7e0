//! Feed Module
//!
//! Feeds with nested comments, sub-comments and like sets.
//!
//! - **`db`** - row-level store access
//! - **`service`** - `FeedService`, the operations exposed to the route layer

pub mod db;
pub mod service;

pub use service::FeedService;
