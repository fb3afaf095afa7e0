//! Backend Module
//!
//! Server-side service layer: store access, the services the route layer
//! calls, identity verification and notification delivery.
//!
//! # Architecture
//!
//! - **`server`** - configuration, application state, start-up
//! - **`auth`** - JWT session tokens
//! - **`middleware`** - the `AuthUser` extractor
//! - **`error`** - `BackendError` and its HTTP mapping
//! - **`users`** - user accounts and point balances
//! - **`points`** - point accrual rules
//! - **`images`** - image upload store
//! - **`feed`** - feeds, comments and likes
//! - **`chat`** - two-party chats
//! - **`push`** - web-push and FCM fan-out
//! - **`study`** - study group and vote records
//! - **`gift`**, **`log`**, **`register`** - gifts, activity log, sign-up
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs
//! ├── server/      - config, state, init
//! ├── auth/        - sessions
//! ├── middleware/  - auth extractor
//! ├── error/       - error types and conversion
//! ├── users/       - db
//! ├── points.rs
//! ├── images.rs
//! ├── feed/        - db, service
//! ├── chat/        - db, service
//! ├── push/        - backends, db, service, notifier
//! ├── study/       - db
//! ├── gift/        - db, service
//! ├── log/         - db, service
//! └── register/    - db, service
//! ```
//!
//! # Data Flow
//!
//! The route layer extracts the caller `Identity` with `AuthUser`, then calls
//! a service method with it. Services are stateless: each call runs its own
//! store round trips (in one transaction when it changes several records)
//! and returns a serialisable value or a `BackendError`.

/// Server initialization, state and configuration
pub mod server;

/// Authentication and session tokens
pub mod auth;

/// Request extractors
pub mod middleware;

/// Backend error types
pub mod error;

/// User accounts
pub mod users;

/// Point accrual rules
pub mod points;

/// Image upload store
pub mod images;

/// Feeds with comments and likes
pub mod feed;

/// Two-party chats
pub mod chat;

/// Push notification fan-out
pub mod push;

/// Study groups and votes
pub mod study;

/// Gift draw entries
pub mod gift;

/// Activity log
pub mod log;

/// Registration and approval
pub mod register;

pub use error::{BackendError, BackendResult};
pub use server::AppState;
