//! Activity log queries

use sqlx::SqlitePool;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::log::db::find_logs;
use crate::shared::log::{LogEntry, LogType};
use crate::shared::Identity;

#[derive(Clone)]
pub struct LogService {
    pool: SqlitePool,
}

impl LogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The caller's own entries of one type
    pub async fn get_log(&self, caller: &Identity, log_type: &str) -> BackendResult<Vec<LogEntry>> {
        let log_type = parse_log_type(log_type)?;
        let mut conn = self.pool.acquire().await?;
        Ok(find_logs(&mut conn, log_type, Some(&caller.uid)).await?)
    }

    /// Every user's entries of one type
    pub async fn get_all_log(&self, log_type: &str) -> BackendResult<Vec<LogEntry>> {
        let log_type = parse_log_type(log_type)?;
        let mut conn = self.pool.acquire().await?;
        Ok(find_logs(&mut conn, log_type, None).await?)
    }
}

fn parse_log_type(raw: &str) -> BackendResult<LogType> {
    LogType::from_str(raw).ok_or_else(|| {
        BackendError::validation("type", format!("Unknown log type '{}'", raw))
    })
}
