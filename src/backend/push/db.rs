//! Database operations for push registrations

use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::shared::notification::{NotificationSubscription, PushChannel, SubscriptionKeys};

const SUBSCRIPTION_COLUMNS: &str = "id, uid, channel, endpoint, p256dh, auth, created_at";

fn subscription_from_row(row: SqliteRow, channel: PushChannel) -> NotificationSubscription {
    let keys = match (row.get::<Option<String>, _>("p256dh"), row.get::<Option<String>, _>("auth")) {
        (Some(p256dh), Some(auth)) => Some(SubscriptionKeys { p256dh, auth }),
        _ => None,
    };

    NotificationSubscription {
        id: row.get("id"),
        uid: row.get("uid"),
        channel,
        endpoint: row.get("endpoint"),
        keys,
        created_at: row.get("created_at"),
    }
}

/// Store a registration unless `(uid, channel, endpoint)` already exists
///
/// # Returns
/// `true` when a new row was written
pub async fn insert_subscription(
    conn: &mut SqliteConnection,
    uid: &str,
    channel: PushChannel,
    endpoint: &str,
    keys: Option<&SubscriptionKeys>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO notification_subscriptions (id, uid, channel, endpoint, p256dh, auth, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (uid, channel, endpoint) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(uid)
    .bind(channel.as_str())
    .bind(endpoint)
    .bind(keys.map(|k| k.p256dh.as_str()))
    .bind(keys.map(|k| k.auth.as_str()))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete_subscription(
    conn: &mut SqliteConnection,
    uid: &str,
    channel: PushChannel,
    endpoint: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM notification_subscriptions WHERE uid = ? AND channel = ? AND endpoint = ?",
    )
    .bind(uid)
    .bind(channel.as_str())
    .bind(endpoint)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete_subscription_by_id(conn: &mut SqliteConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM notification_subscriptions WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Every registration of a channel
pub async fn all_subscriptions(
    conn: &mut SqliteConnection,
    channel: PushChannel,
) -> Result<Vec<NotificationSubscription>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM notification_subscriptions WHERE channel = ? ORDER BY rowid",
        SUBSCRIPTION_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(channel.as_str())
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(|row| subscription_from_row(row, channel)).collect())
}

/// Registrations of a channel owned by any uid in `uids`
pub async fn subscriptions_for_uids(
    conn: &mut SqliteConnection,
    channel: PushChannel,
    uids: &BTreeSet<String>,
) -> Result<Vec<NotificationSubscription>, sqlx::Error> {
    if uids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM notification_subscriptions WHERE channel = ",
        SUBSCRIPTION_COLUMNS
    ));
    query.push_bind(channel.as_str()).push(" AND uid IN (");
    let mut separated = query.separated(", ");
    for uid in uids {
        separated.push_bind(uid.clone());
    }
    separated.push_unseparated(") ORDER BY rowid");

    let rows = query.build().fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().map(|row| subscription_from_row(row, channel)).collect())
}
