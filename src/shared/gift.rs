//! Gift Redemption Records

use serde::{Deserialize, Serialize};

use super::error::SharedError;

/// One user's entries for one gift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GiftRecord {
    pub uid: String,
    pub gift_id: i64,
    pub name: String,
    pub cnt: i64,
}

/// Most tickets one request may add
pub const MAX_GIFT_TICKETS: i64 = 1_000;

/// Request to enter a gift draw
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGiftRequest {
    pub name: String,
    pub cnt: i64,
    pub gift_id: i64,
}

impl SetGiftRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.cnt <= 0 {
            return Err(SharedError::validation("cnt", "Count must be positive"));
        }
        if self.cnt > MAX_GIFT_TICKETS {
            return Err(SharedError::validation(
                "cnt",
                format!("Count must be at most {}", MAX_GIFT_TICKETS),
            ));
        }
        Ok(())
    }
}
