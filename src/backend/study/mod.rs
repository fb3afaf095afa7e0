//! Study Module
//!
//! Study groups and daily vote records, read by the notification fan-out.

pub mod db;
