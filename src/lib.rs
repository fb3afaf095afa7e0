//! studyabout - Community Service Layer
//!
//! Server-side services of a community and study-group application: sign-up
//! and approval, feeds with nested comments and likes, point and gift
//! accounting, two-party chat, an activity log, and push notifications over
//! web-push and FCM.
//!
//! # Module Structure
//!
//! - **`shared`** - plain data types and the pure rules on them
//!   - users, feeds, chats, notifications, study votes, gifts, logs
//!   - `Identity` and id parsing
//!   - `SharedError`
//!
//! - **`backend`** - store access and services
//!   - SQLite store through sqlx, schema in `migrations/`
//!   - `FeedService`, `ChatService`, `PushService`, `Notifier`,
//!     `GiftService`, `LogService`, `RegisterService`
//!   - JWT identity extractor and `BackendError` → HTTP mapping
//!
//! # Usage
//!
//! ```rust,no_run
//! use studyabout::backend::server::{init_state, init_tracing, ServerConfig};
//! use studyabout::shared::feed::FeedPage;
//! use studyabout::shared::Identity;
//!
//! # async fn example(caller: Identity) -> Result<(), studyabout::backend::BackendError> {
//! init_tracing();
//! let state = init_state(&ServerConfig::from_env()).await?;
//! let feeds = state.feed.find_all_feeds(&caller, FeedPage::new(Some(0), Some(true))).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `Result<T, BackendError>` for every service operation
//! - `SharedError` for validation in the data layer
//! - `PushError` for single deliveries; it is counted, never returned

/// Shared types and data structures
pub mod shared;

/// Backend services
pub mod backend;
