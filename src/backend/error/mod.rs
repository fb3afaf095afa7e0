//! Backend Error Module
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! Every service operation returns `Result<T, BackendError>`. Push delivery
//! has its own `PushError` in `backend::push`, since a failed endpoint is
//! recorded in a fan-out report rather than returned to the caller.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;

/// Result alias used across the services
pub type BackendResult<T> = Result<T, BackendError>;
