//! Recording push backend
//!
//! Stands in for a vendor push service: records every delivery and fails
//! the endpoints it was told to fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::SqlitePool;

use studyabout::backend::push::{PushBackend, PushError, PushService};
use studyabout::shared::notification::{
    NotificationPayload, NotificationSubscription, PayloadTemplate, PushChannel,
};

/// One recorded delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    pub uid: String,
    pub endpoint: String,
    pub title: String,
    pub body: String,
}

#[derive(Clone)]
pub struct RecordingBackend {
    channel: PushChannel,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    failures: Arc<Mutex<HashMap<String, u16>>>,
}

impl RecordingBackend {
    pub fn new(channel: PushChannel) -> Self {
        Self {
            channel,
            deliveries: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Answer deliveries to `endpoint` with `status`
    pub fn fail_endpoint(&self, endpoint: &str, status: u16) {
        self.failures.lock().unwrap().insert(endpoint.to_string(), status);
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn deliveries_to(&self, uid: &str) -> Vec<Delivery> {
        self.deliveries().into_iter().filter(|d| d.uid == uid).collect()
    }
}

#[async_trait]
impl PushBackend for RecordingBackend {
    fn channel(&self) -> PushChannel {
        self.channel
    }

    async fn deliver(
        &self,
        subscription: &NotificationSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), PushError> {
        if let Some(status) = self.failures.lock().unwrap().get(&subscription.endpoint) {
            return Err(PushError::from_status(*status, "mock failure".to_string()));
        }

        self.deliveries.lock().unwrap().push(Delivery {
            uid: subscription.uid.clone(),
            endpoint: subscription.endpoint.clone(),
            title: payload.title.clone(),
            body: payload.body.clone(),
        });
        Ok(())
    }
}

pub fn test_template() -> PayloadTemplate {
    PayloadTemplate {
        badge: "https://cdn.example.com/badge.png".to_string(),
        icon: "https://cdn.example.com/icon.png".to_string(),
        url: "https://study.example.com/".to_string(),
    }
}

/// A push service over a fresh recording backend
pub fn recording_service(pool: &SqlitePool, channel: PushChannel) -> (PushService, RecordingBackend) {
    let backend = RecordingBackend::new(channel);
    let service = PushService::new(pool.clone(), Arc::new(backend.clone()), test_template());
    (service, backend)
}
