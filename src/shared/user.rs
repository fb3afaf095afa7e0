//! User Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account with its point balance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// External identity key
    pub uid: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub point: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Non-sensitive projection of a user, used in every read response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub uid: String,
    pub name: String,
    pub profile_image: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            uid: user.uid,
            name: user.name,
            profile_image: user.profile_image,
        }
    }
}
