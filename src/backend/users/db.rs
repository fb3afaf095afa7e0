/**
 * User Database Operations
 *
 * Every function takes a connection rather than a pool so callers can run
 * it inside their own transaction (`&mut *tx`) or on a pooled connection.
 */

use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::shared::{User, UserSummary};

/// Create a new user
///
/// # Arguments
/// * `conn` - Database connection
/// * `uid` - External identity key
/// * `name` - Display name
/// * `profile_image` - Optional avatar URL
///
/// # Returns
/// Created user or error
pub async fn create_user(
    conn: &mut SqliteConnection,
    uid: &str,
    name: &str,
    profile_image: Option<&str>,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, uid, name, profile_image, point, role, created_at)
        VALUES (?, ?, ?, ?, 0, 'member', ?)
        RETURNING id, uid, name, profile_image, point, role, created_at
        "#,
    )
    .bind(id)
    .bind(uid)
    .bind(name)
    .bind(profile_image)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(user)
}

/// Get user by ID
pub async fn get_user_by_id(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, uid, name, profile_image, point, role, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// Get user by external identity key
pub async fn get_user_by_uid(
    conn: &mut SqliteConnection,
    uid: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, uid, name, profile_image, point, role, created_at
        FROM users
        WHERE uid = ?
        "#,
    )
    .bind(uid)
    .fetch_optional(&mut *conn)
    .await
}

/// Public projection of one user
pub async fn get_user_summary(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, uid, name, profile_image
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// Atomically add `delta` to a user's point balance
///
/// # Returns
/// The user's uid, or `None` when no such user exists
pub async fn add_points(
    conn: &mut SqliteConnection,
    id: Uuid,
    delta: i64,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        UPDATE users SET point = point + ?
        WHERE id = ?
        RETURNING uid
        "#,
    )
    .bind(delta)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// Deduct `amount` points only if the balance covers it
///
/// # Returns
/// `true` when the deduction was applied
pub async fn deduct_points_if_covered(
    conn: &mut SqliteConnection,
    id: Uuid,
    amount: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users SET point = point - ?
        WHERE id = ? AND point >= ?
        "#,
    )
    .bind(amount)
    .bind(id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
