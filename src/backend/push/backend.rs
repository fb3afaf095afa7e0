/**
 * Push Backends
 *
 * A `PushBackend` delivers one payload to one registration over a vendor
 * protocol. Services fan out over many registrations and treat each
 * delivery independently, so a backend only reports what happened to the
 * single message it was given.
 */

use async_trait::async_trait;
use thiserror::Error;

use crate::shared::notification::{NotificationPayload, NotificationSubscription, PushChannel};

/// Failure of a single delivery
#[derive(Debug, Error)]
pub enum PushError {
    /// Transport failure before the push service answered
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The push service answered with a non-success status
    #[error("Push service rejected the message with {status}: {body}")]
    Rejected {
        status: u16,
        body: String,
    },

    /// The registration no longer exists at the push service
    #[error("Subscription is gone ({status})")]
    Gone {
        status: u16,
    },

    /// The VAPID authorization header could not be produced
    #[error("VAPID error: {0}")]
    Vapid(String),

    /// The payload could not be encrypted for the registration keys
    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl PushError {
    /// Classify a non-success response
    ///
    /// 404 and 410 mean the registration has expired or was revoked.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 | 410 => PushError::Gone { status },
            _ => PushError::Rejected { status, body },
        }
    }

    pub fn is_gone(&self) -> bool {
        matches!(self, PushError::Gone { .. })
    }
}

#[async_trait]
pub trait PushBackend: Send + Sync {
    /// Channel whose registrations this backend can deliver to
    fn channel(&self) -> PushChannel;

    async fn deliver(
        &self,
        subscription: &NotificationSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(PushError::from_status(410, String::new()).is_gone());
        assert!(PushError::from_status(404, String::new()).is_gone());
        match PushError::from_status(429, "slow down".to_string()) {
            PushError::Rejected { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            _ => panic!("Expected Rejected"),
        }
    }
}
