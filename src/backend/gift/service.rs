/**
 * Gift Service
 *
 * Users spend tickets on gift draws. Each `(uid, gift)` pair has one record
 * whose count accumulates over redemptions. With a ticket cost configured
 * the redemption also charges points, in the same transaction as the count.
 */

use sqlx::SqlitePool;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::gift::db;
use crate::backend::points::spend_points;
use crate::shared::gift::{GiftRecord, SetGiftRequest};
use crate::shared::Identity;

#[derive(Clone)]
pub struct GiftService {
    pool: SqlitePool,
    ticket_cost: i64,
}

impl GiftService {
    pub fn new(pool: SqlitePool, ticket_cost: i64) -> Self {
        Self { pool, ticket_cost }
    }

    /// Every record in creation order
    pub async fn get_all_gift(&self) -> BackendResult<Vec<GiftRecord>> {
        let mut conn = self.pool.acquire().await?;
        Ok(db::all_gifts(&mut conn).await?)
    }

    /// Every user's record for one gift
    pub async fn get_gift(&self, gift_id: i64) -> BackendResult<Vec<GiftRecord>> {
        let mut conn = self.pool.acquire().await?;
        Ok(db::gifts_by_id(&mut conn, gift_id).await?)
    }

    /// Add the caller's tickets for a gift
    ///
    /// Fails with `Conflict` when the caller cannot pay for the tickets.
    pub async fn set_gift(&self, caller: &Identity, request: SetGiftRequest) -> BackendResult<GiftRecord> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;
        if self.ticket_cost > 0 {
            let cost = request
                .cnt
                .checked_mul(self.ticket_cost)
                .ok_or_else(|| BackendError::validation("cnt", "Ticket cost is out of range"))?;
            let message = format!("gift {} x{}", request.gift_id, request.cnt);
            spend_points(&mut tx, caller.id, cost, &message).await?;
        }
        let record = db::upsert_gift(&mut tx, &caller.uid, request.gift_id, &request.name, request.cnt).await?;
        tx.commit().await?;

        tracing::info!("{} now holds {} ticket(s) for gift {}", record.uid, record.cnt, record.gift_id);
        Ok(record)
    }
}
