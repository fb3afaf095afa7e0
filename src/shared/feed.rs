//! Feed Data Structures
//!
//! Feeds carry nested comments, sub-comments and like sets. The store keeps
//! each level in its own table; these are the read-side shapes handed back to
//! callers, plus the request types and the pure display rules that apply to
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::SharedError;
use super::identity::parse_id;
use super::user::UserSummary;

/// Number of feeds per page
pub const FEED_PAGE_SIZE: u32 = 12;

/// Maximum number of likers included in a feed's display list
pub const LIKE_DISPLAY_LIMIT: usize = 8;

/// Sort direction for feed pages
///
/// Only an explicit `is_recent == true` sorts newest first; an absent flag
/// behaves like `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrder {
    NewestFirst,
    OldestFirst,
}

impl FeedOrder {
    pub fn from_is_recent(is_recent: Option<bool>) -> Self {
        if is_recent == Some(true) {
            FeedOrder::NewestFirst
        } else {
            FeedOrder::OldestFirst
        }
    }
}

/// Page request for feed listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub cursor: Option<u32>,
    pub is_recent: Option<bool>,
}

impl FeedPage {
    pub fn new(cursor: Option<u32>, is_recent: Option<bool>) -> Self {
        Self { cursor, is_recent }
    }

    pub fn offset(&self) -> i64 {
        i64::from(FEED_PAGE_SIZE) * i64::from(self.cursor.unwrap_or(0))
    }

    pub fn order(&self) -> FeedOrder {
        FeedOrder::from_is_recent(self.is_recent)
    }
}

/// Fields for a new feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedRequest {
    pub title: String,
    pub text: String,
    #[serde(rename = "type")]
    pub feed_type: String,
    pub type_id: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub sub_category: Option<String>,
    /// Raw image bytes from the upload; never part of the JSON body
    #[serde(skip)]
    pub buffers: Vec<Vec<u8>>,
}

impl CreateFeedRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.title.trim().is_empty() {
            return Err(SharedError::validation("title", "Title cannot be empty"));
        }
        if self.feed_type.trim().is_empty() {
            return Err(SharedError::validation("type", "Feed type is required"));
        }
        Ok(())
    }
}

/// A sub-comment as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubCommentView {
    pub id: Uuid,
    pub user: UserSummary,
    pub comment: String,
    pub like_list: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A comment with its sub-comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub user: UserSummary,
    pub comment: String,
    pub like_list: Vec<Uuid>,
    pub sub_comments: Vec<SubCommentView>,
    pub created_at: DateTime<Utc>,
}

/// A fully populated feed
///
/// `like` is the display list produced by [`arrange_likes`]; `like_cnt` is
/// always the real number of likers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub id: Uuid,
    pub writer: UserSummary,
    #[serde(rename = "type")]
    pub feed_type: String,
    pub type_id: Option<String>,
    pub title: String,
    pub text: String,
    pub images: Vec<String>,
    pub is_anonymous: bool,
    pub sub_category: Option<String>,
    pub like: Vec<UserSummary>,
    pub like_cnt: i64,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
}

/// Result of flipping the caller's like on a feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub like_cnt: i64,
}

/// Build the like display list for a caller
///
/// If the caller is among the likers they go first, followed by up to
/// `LIKE_DISPLAY_LIMIT - 1` other likers in like order. Otherwise the first
/// `LIKE_DISPLAY_LIMIT` likers are kept.
pub fn arrange_likes(likers: Vec<UserSummary>, caller_uid: &str) -> Vec<UserSummary> {
    match likers.iter().position(|liker| liker.uid == caller_uid) {
        Some(index) => {
            let mut likers = likers;
            let mine = likers.remove(index);
            let mut arranged = Vec::with_capacity(LIKE_DISPLAY_LIMIT);
            arranged.push(mine);
            arranged.extend(likers.into_iter().take(LIKE_DISPLAY_LIMIT - 1));
            arranged
        }
        None => likers.into_iter().take(LIKE_DISPLAY_LIMIT).collect(),
    }
}

/// Address of a comment inside a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentPath {
    pub feed_id: Uuid,
    pub comment_id: Uuid,
}

impl CommentPath {
    pub fn parse(feed_id: &str, comment_id: &str) -> Result<Self, SharedError> {
        Ok(Self {
            feed_id: parse_id("feedId", feed_id)?,
            comment_id: parse_id("commentId", comment_id)?,
        })
    }
}

/// Address of a sub-comment inside a comment inside a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubCommentPath {
    pub comment: CommentPath,
    pub sub_comment_id: Uuid,
}

impl SubCommentPath {
    pub fn parse(feed_id: &str, comment_id: &str, sub_comment_id: &str) -> Result<Self, SharedError> {
        Ok(Self {
            comment: CommentPath::parse(feed_id, comment_id)?,
            sub_comment_id: parse_id("subCommentId", sub_comment_id)?,
        })
    }
}

/// Reject blank comment text
pub fn validate_comment(content: &str) -> Result<(), SharedError> {
    if content.trim().is_empty() {
        return Err(SharedError::validation("comment", "Comment cannot be empty"));
    }
    Ok(())
}
