//! Database operations for gift draw entries

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::shared::gift::GiftRecord;

/// Add `cnt` entries for `(uid, gift_id)`, creating the record if needed
pub async fn upsert_gift(
    conn: &mut SqliteConnection,
    uid: &str,
    gift_id: i64,
    name: &str,
    cnt: i64,
) -> Result<GiftRecord, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, GiftRecord>(
        r#"
        INSERT INTO gifts (uid, gift_id, name, cnt, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (uid, gift_id) DO UPDATE SET
            cnt = gifts.cnt + excluded.cnt,
            name = excluded.name,
            updated_at = excluded.updated_at
        RETURNING uid, gift_id, name, cnt
        "#,
    )
    .bind(uid)
    .bind(gift_id)
    .bind(name)
    .bind(cnt)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn all_gifts(conn: &mut SqliteConnection) -> Result<Vec<GiftRecord>, sqlx::Error> {
    sqlx::query_as::<_, GiftRecord>(
        "SELECT uid, gift_id, name, cnt FROM gifts ORDER BY created_at, rowid",
    )
    .fetch_all(&mut *conn)
    .await
}

pub async fn gifts_by_id(conn: &mut SqliteConnection, gift_id: i64) -> Result<Vec<GiftRecord>, sqlx::Error> {
    sqlx::query_as::<_, GiftRecord>(
        "SELECT uid, gift_id, name, cnt FROM gifts WHERE gift_id = ? ORDER BY created_at, rowid",
    )
    .bind(gift_id)
    .fetch_all(&mut *conn)
    .await
}
