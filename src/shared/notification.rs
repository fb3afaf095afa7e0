//! Push Notification Data Structures
//!
//! Registrations for both delivery channels share one shape: a user's
//! external identity key plus a channel-specific address (a web-push endpoint
//! URL or an FCM device token).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default title when a caller sends a notification without one
pub const DEFAULT_TITLE: &str = "Test notification";

/// Default body when a caller sends a notification without one
pub const DEFAULT_BODY: &str = "This is a test notification";

/// Delivery channel of a registration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PushChannel {
    /// Browser web-push endpoint
    Web,
    /// Firebase Cloud Messaging device token
    Fcm,
}

impl PushChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushChannel::Web => "web",
            PushChannel::Fcm => "fcm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "web" => Some(PushChannel::Web),
            "fcm" => Some(PushChannel::Fcm),
            _ => None,
        }
    }
}

/// Client keys of a web-push subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A stored registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSubscription {
    pub id: Uuid,
    pub uid: String,
    pub channel: PushChannel,
    pub endpoint: String,
    pub keys: Option<SubscriptionKeys>,
    pub created_at: DateTime<Utc>,
}

/// Body of a subscribe call; the owner comes from the caller identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    #[serde(default)]
    pub keys: Option<SubscriptionKeys>,
}

/// Extra data attached to every notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub url: String,
    pub notification_type: String,
}

/// JSON payload delivered to a device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub badge: String,
    pub icon: String,
    pub data: NotificationData,
    pub tag: String,
    pub require_interaction: bool,
    pub silent: bool,
    pub renotify: bool,
    /// Milliseconds since the epoch at build time
    pub timestamp: i64,
    pub vibrate: Vec<u32>,
    pub priority: String,
}

/// Static parts of the base payload, taken from configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadTemplate {
    pub badge: String,
    pub icon: String,
    pub url: String,
}

impl PayloadTemplate {
    /// The base payload every notification starts from
    pub fn base(&self) -> NotificationPayload {
        NotificationPayload {
            title: "Study vote".to_string(),
            body: "Voting closes soon. Sign up now!".to_string(),
            badge: self.badge.clone(),
            icon: self.icon.clone(),
            data: NotificationData {
                url: self.url.clone(),
                notification_type: "studyReminder".to_string(),
            },
            tag: "unique_tag_for_this_notification".to_string(),
            require_interaction: true,
            silent: false,
            renotify: true,
            timestamp: Utc::now().timestamp_millis(),
            vibrate: vec![100, 50, 100],
            priority: "high".to_string(),
        }
    }

    /// Base payload with title and body replaced
    pub fn with_overrides(&self, title: impl Into<String>, body: impl Into<String>) -> NotificationPayload {
        NotificationPayload {
            title: title.into(),
            body: body.into(),
            ..self.base()
        }
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FanOutReport {
    /// Endpoints a delivery was attempted on
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Registrations removed because the vendor reported them gone
    pub pruned: usize,
}

impl FanOutReport {
    pub fn merge(self, other: FanOutReport) -> FanOutReport {
        FanOutReport {
            attempted: self.attempted + other.attempted,
            delivered: self.delivered + other.delivered,
            failed: self.failed + other.failed,
            pruned: self.pruned + other.pruned,
        }
    }
}
