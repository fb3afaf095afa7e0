//! Push Module
//!
//! Multi-channel notification fan-out.
//!
//! ```text
//! push/
//! ├── backend.rs  - PushBackend trait and PushError
//! ├── webpush.rs  - browser push service delivery (VAPID)
//! ├── fcm.rs      - Firebase Cloud Messaging HTTP v1 delivery
//! ├── db.rs       - registration storage
//! ├── service.rs  - PushService: subscribe and the send operations
//! └── notifier.rs - Notifier: one message on every channel
//! ```

pub mod backend;
pub mod db;
pub mod fcm;
pub mod notifier;
pub mod service;
pub mod webpush;

pub use backend::{PushBackend, PushError};
pub use fcm::{FcmAccessToken, FcmBackend};
pub use notifier::Notifier;
pub use service::PushService;
pub use webpush::{VapidSigner, WebPushBackend};
