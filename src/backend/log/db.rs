//! Database operations for the activity log

use sqlx::{Row, SqliteConnection};

use crate::shared::log::{LogEntry, LogMeta, LogType};

/// Append one entry
pub async fn append_log(conn: &mut SqliteConnection, entry: &LogEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO logs (timestamp, message, meta_type, meta_uid, meta_value)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.timestamp)
    .bind(&entry.message)
    .bind(entry.meta.log_type.as_str())
    .bind(&entry.meta.uid)
    .bind(entry.meta.value)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Entries of one type, oldest first, optionally limited to one uid
pub async fn find_logs(
    conn: &mut SqliteConnection,
    log_type: LogType,
    uid: Option<&str>,
) -> Result<Vec<LogEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT timestamp, message, meta_uid, meta_value
        FROM logs
        WHERE meta_type = ? AND (? IS NULL OR meta_uid = ?)
        ORDER BY timestamp, rowid
        "#,
    )
    .bind(log_type.as_str())
    .bind(uid)
    .bind(uid)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| LogEntry {
            timestamp: row.get("timestamp"),
            message: row.get("message"),
            meta: LogMeta {
                log_type,
                uid: row.get("meta_uid"),
                value: row.get("meta_value"),
            },
        })
        .collect())
}
