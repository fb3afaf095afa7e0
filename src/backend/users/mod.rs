//! Users Module
//!
//! Storage of user accounts and their point balances.

pub mod db;

pub use db::{create_user, get_user_by_id, get_user_by_uid, get_user_summary};
