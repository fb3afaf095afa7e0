//! Chat Data Structures
//!
//! One chat thread exists per unordered pair of users. The pair is stored in
//! canonical order (`user1 < user2`) so a lookup from either side lands on the
//! same row.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::user::UserSummary;

/// Sentinel returned by `get_recent_chat` when the caller has no chats
pub const NO_CHAT: &str = "no chat";

/// A single message in a chat thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatContent {
    pub content: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A thread seen from one participant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatThread {
    pub opponent: UserSummary,
    pub contents: Vec<ChatContent>,
}

/// Chat list entry: the other participant and the latest message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatPreview {
    pub user: UserSummary,
    pub content: Option<ChatContent>,
}

/// Most recently updated chat of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentChat {
    Found(Uuid),
    NoChat,
}

impl Serialize for RecentChat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecentChat::Found(id) => id.serialize(serializer),
            RecentChat::NoChat => serializer.serialize_str(NO_CHAT),
        }
    }
}

/// Message body for a new chat entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    pub to_user_id: String,
    pub message: String,
}

/// Order a user pair so that `user1 < user2`
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Sort chat previews newest first; previews without content go last
pub fn sort_previews(previews: &mut [ChatPreview]) {
    previews.sort_by(|a, b| match (&a.content, &b.content) {
        (Some(a), Some(b)) => b.created_at.cmp(&a.created_at),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
