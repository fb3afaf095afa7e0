//! Database operations for two-party chats
//!
//! Callers pass pairs already in canonical order (`user1 < user2`).

use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::shared::chat::ChatContent;

pub async fn find_chat_id(
    conn: &mut SqliteConnection,
    user1: Uuid,
    user2: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM chats WHERE user1 = ? AND user2 = ?")
        .bind(user1)
        .bind(user2)
        .fetch_optional(&mut *conn)
        .await
}

/// Get the chat of a pair, creating it when absent, and mark it updated
pub async fn upsert_chat(conn: &mut SqliteConnection, user1: Uuid, user2: Uuid) -> Result<Uuid, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO chats (id, user1, user2, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user1, user2) DO UPDATE SET updated_at = excluded.updated_at
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user1)
    .bind(user2)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_content(
    conn: &mut SqliteConnection,
    chat_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO chat_contents (chat_id, user_id, content, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(content)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Messages of a chat in the order they were sent
pub async fn chat_contents(conn: &mut SqliteConnection, chat_id: Uuid) -> Result<Vec<ChatContent>, sqlx::Error> {
    sqlx::query_as::<_, ChatContent>(
        r#"
        SELECT content, user_id, created_at
        FROM chat_contents
        WHERE chat_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(chat_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn latest_content(conn: &mut SqliteConnection, chat_id: Uuid) -> Result<Option<ChatContent>, sqlx::Error> {
    sqlx::query_as::<_, ChatContent>(
        r#"
        SELECT content, user_id, created_at
        FROM chat_contents
        WHERE chat_id = ?
        ORDER BY rowid DESC
        LIMIT 1
        "#,
    )
    .bind(chat_id)
    .fetch_optional(&mut *conn)
    .await
}

/// `(chat id, opponent id)` of every chat a user takes part in
pub async fn chats_for_user(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Vec<(Uuid, Uuid)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, CASE WHEN user1 = ? THEN user2 ELSE user1 END AS opponent
        FROM chats
        WHERE user1 = ? OR user2 = ?
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|row| (row.get("id"), row.get("opponent"))).collect())
}

/// The user's chat with the latest activity
pub async fn most_recent_chat(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM chats
        WHERE user1 = ? OR user2 = ?
        ORDER BY updated_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
}
