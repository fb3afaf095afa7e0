/**
 * Point Accrual
 *
 * Social actions move points between nobody and a user: writing a comment
 * pays its author, a like pays the feed's writer and taking it back costs
 * the writer less than the like paid. A like/unlike cycle therefore nets +1.
 *
 * Every change is applied with an atomic `point = point + ?` and recorded as
 * a `point` log entry on the same connection, so when the caller runs these
 * inside its transaction the balance, the log and the triggering mutation
 * commit together.
 */

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::log::db::append_log;
use crate::backend::users::db::{add_points, deduct_points_if_covered, get_user_by_id};
use crate::shared::log::{LogEntry, LogMeta, LogType};

/// A social action that changes a point balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRule {
    /// The author of a new comment
    CommentWritten,
    /// The writer of a feed someone liked
    FeedLiked,
    /// The writer of a feed someone un-liked
    FeedUnliked,
}

impl PointRule {
    pub fn delta(&self) -> i64 {
        match self {
            PointRule::CommentWritten => 2,
            PointRule::FeedLiked => 2,
            PointRule::FeedUnliked => -1,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PointRule::CommentWritten => "comment written",
            PointRule::FeedLiked => "feed liked",
            PointRule::FeedUnliked => "feed like cancelled",
        }
    }
}

/// Apply a rule to a user's balance and log it
pub async fn award(conn: &mut SqliteConnection, user_id: Uuid, rule: PointRule) -> BackendResult<()> {
    apply_points(conn, user_id, rule.delta(), rule.message()).await
}

/// Add a signed amount to a user's balance and log it
pub async fn apply_points(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    delta: i64,
    message: &str,
) -> BackendResult<()> {
    let uid = add_points(conn, user_id, delta)
        .await?
        .ok_or_else(|| BackendError::not_found("user", user_id))?;

    tracing::debug!("Point change {:+} for {} ({})", delta, uid, message);
    log_point_change(conn, uid, delta, message).await
}

/// Spend points, failing with `Conflict` when the balance is too low
pub async fn spend_points(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    amount: i64,
    message: &str,
) -> BackendResult<()> {
    if amount < 0 {
        return Err(BackendError::validation("amount", "Cannot spend a negative amount"));
    }
    if amount == 0 {
        return Ok(());
    }

    if !deduct_points_if_covered(conn, user_id, amount).await? {
        return match get_user_by_id(conn, user_id).await? {
            Some(user) => Err(BackendError::conflict(format!(
                "Not enough points: {} required, {} available",
                amount, user.point
            ))),
            None => Err(BackendError::not_found("user", user_id)),
        };
    }

    let user = get_user_by_id(conn, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("user", user_id))?;
    log_point_change(conn, user.uid, -amount, message).await
}

async fn log_point_change(
    conn: &mut SqliteConnection,
    uid: String,
    value: i64,
    message: &str,
) -> BackendResult<()> {
    let entry = LogEntry {
        timestamp: Utc::now(),
        message: message.to_string(),
        meta: LogMeta {
            log_type: LogType::Point,
            uid,
            value,
        },
    };
    append_log(conn, &entry).await?;
    Ok(())
}
