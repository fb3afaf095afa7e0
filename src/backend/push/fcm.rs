/**
 * FCM Backend
 *
 * Sends through the Firebase Cloud Messaging HTTP v1 API. The registration
 * endpoint holds the device token; title and body travel as the
 * notification block and the click target as string data.
 *
 * OAuth2 tokens for the messaging scope expire after about an hour. The
 * backend reads its bearer token from a shared `FcmAccessToken`, so whatever
 * mints fresh tokens can swap them in while the service keeps running.
 */

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tokio::sync::RwLock;

use crate::backend::push::backend::{PushBackend, PushError};
use crate::backend::server::config::FcmConfig;
use crate::shared::notification::{NotificationPayload, NotificationSubscription, PushChannel};

/// Bearer token shared between the backend and its refresher
#[derive(Clone, Default)]
pub struct FcmAccessToken(Arc<RwLock<String>>);

impl FcmAccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(token.into())))
    }

    /// Replace the token used by every later delivery
    pub async fn set(&self, token: impl Into<String>) {
        *self.0.write().await = token.into();
        tracing::info!("FCM access token refreshed");
    }

    pub async fn get(&self) -> String {
        self.0.read().await.clone()
    }
}

#[derive(Clone)]
pub struct FcmBackend {
    client: Client,
    send_url: String,
    access_token: FcmAccessToken,
}

impl FcmBackend {
    pub fn new(client: Client, config: &FcmConfig) -> Self {
        Self {
            client,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                config.base_url.trim_end_matches('/'),
                config.project_id
            ),
            access_token: FcmAccessToken::new(config.access_token.clone()),
        }
    }

    /// Handle for refreshing the bearer token
    pub fn access_token(&self) -> FcmAccessToken {
        self.access_token.clone()
    }
}

/// FCM v1 message body for one device token
fn fcm_message(token: &str, payload: &NotificationPayload) -> serde_json::Value {
    json!({
        "message": {
            "token": token,
            "notification": {
                "title": payload.title,
                "body": payload.body,
            },
            "data": {
                "url": payload.data.url,
                "notificationType": payload.data.notification_type,
            },
            "android": {
                "priority": payload.priority,
            },
        }
    })
}

#[async_trait]
impl PushBackend for FcmBackend {
    fn channel(&self) -> PushChannel {
        PushChannel::Fcm
    }

    async fn deliver(
        &self,
        subscription: &NotificationSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        let token = self.access_token.get().await;
        if token.is_empty() {
            tracing::warn!("FCM access token is empty, the request will be refused");
        }

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(token)
            .json(&fcm_message(&subscription.endpoint, payload))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("FCM refused the access token; it has to be refreshed");
        }

        let body = response.text().await.unwrap_or_default();
        Err(PushError::from_status(status.as_u16(), body))
    }
}
