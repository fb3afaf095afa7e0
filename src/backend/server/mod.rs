//! Server Module
//!
//! Start-up plumbing: configuration, state and initialisation. The route
//! layer that serves requests is built on top of `AppState` elsewhere.
//!
//! ```text
//! server/
//! ├── mod.rs     - Module exports
//! ├── config.rs  - ServerConfig loaded from the environment
//! ├── state.rs   - AppState and FromRef implementations
//! └── init.rs    - tracing, pool, migrations and service wiring
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use studyabout::backend::server::{init_state, init_tracing, ServerConfig};
//!
//! # async fn example() -> Result<(), studyabout::backend::error::BackendError> {
//! init_tracing();
//! let config = ServerConfig::from_env();
//! let state = init_state(&config).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::{build_state, connect_pool, init_state, init_tracing, run_migrations};
pub use state::AppState;
