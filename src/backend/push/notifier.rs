//! Sends one notification to a user on every configured channel.

use crate::backend::push::service::PushService;
use crate::shared::notification::FanOutReport;

#[derive(Clone)]
pub struct Notifier {
    web_push: PushService,
    fcm: Option<PushService>,
}

impl Notifier {
    pub fn new(web_push: PushService, fcm: Option<PushService>) -> Self {
        Self { web_push, fcm }
    }

    /// Notify `uid` on FCM (when enabled) and web-push
    ///
    /// Each channel is attempted whatever the other's outcome; channel errors
    /// are logged and leave that channel out of the combined report.
    pub async fn notify(&self, uid: &str, title: &str, body: &str) -> FanOutReport {
        let mut report = FanOutReport::default();

        let channels = self.fcm.iter().chain(std::iter::once(&self.web_push));
        for service in channels {
            match service.send_notification_to_x(uid, Some(title), Some(body)).await {
                Ok(channel_report) => report = report.merge(channel_report),
                Err(e) => tracing::warn!(
                    "{} notification to {} failed: {:?}",
                    service.channel().as_str(),
                    uid,
                    e
                ),
            }
        }

        report
    }
}
