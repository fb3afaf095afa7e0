//! Gift Module
//!
//! Gift draw entries and the point charge for them.

pub mod db;
pub mod service;

pub use service::GiftService;
