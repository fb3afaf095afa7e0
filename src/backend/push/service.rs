/**
 * Push Fan-Out Service
 *
 * One `PushService` serves one delivery channel. Every send operation
 * resolves a set of registrations, pairs each with a payload and delivers
 * all of them concurrently. A failed endpoint is logged and counted; it never
 * stops the others. Endpoints the push service reports as gone are removed
 * so later fan-outs skip them.
 *
 * Recipient sets are built before registrations are fetched, so a user who
 * appears in several participation records is still only looked up once.
 */

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures_util::future::join_all;
use sqlx::SqlitePool;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::push::backend::PushBackend;
use crate::backend::push::db;
use crate::backend::study::db::{group_member_uids, vote_participations};
use crate::shared::notification::{
    FanOutReport, NotificationPayload, NotificationSubscription, PayloadTemplate, PushChannel,
    SubscribeRequest, DEFAULT_BODY, DEFAULT_TITLE,
};
use crate::shared::study::{vote_date_at, VoteOutcome, VoteRecipients};
use crate::shared::Identity;

const GROUP_JOIN_TITLE: &str = "Someone joined your study group!";
const GROUP_JOIN_BODY: &str = "Check out your study group.";
const VOTE_SUCCESS_TITLE: &str = "Your study is open!";
const VOTE_SUCCESS_BODY: &str = "Check the study vote result.";
const VOTE_FAILURE_TITLE: &str = "No study opened today.";
const VOTE_FAILURE_BODY: &str = "Join tomorrow's study vote.";

#[derive(Clone)]
pub struct PushService {
    pool: SqlitePool,
    backend: Arc<dyn PushBackend>,
    template: PayloadTemplate,
}

impl PushService {
    pub fn new(pool: SqlitePool, backend: Arc<dyn PushBackend>, template: PayloadTemplate) -> Self {
        Self {
            pool,
            backend,
            template,
        }
    }

    pub fn channel(&self) -> PushChannel {
        self.backend.channel()
    }

    /// Register an endpoint for the caller; registering it again is a no-op
    pub async fn subscribe(&self, caller: &Identity, request: SubscribeRequest) -> BackendResult<()> {
        if request.endpoint.trim().is_empty() {
            return Err(BackendError::validation("endpoint", "Endpoint cannot be empty"));
        }

        let mut conn = self.pool.acquire().await?;
        let created = db::insert_subscription(
            &mut conn,
            &caller.uid,
            self.channel(),
            &request.endpoint,
            request.keys.as_ref(),
        )
        .await?;

        if created {
            tracing::info!("New {} subscription for {}", self.channel().as_str(), caller.uid);
        }
        Ok(())
    }

    /// Remove one of the caller's endpoints
    ///
    /// # Returns
    /// `true` when a registration was removed
    pub async fn unsubscribe(&self, caller: &Identity, endpoint: &str) -> BackendResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(db::delete_subscription(&mut conn, &caller.uid, self.channel(), endpoint).await?)
    }

    /// Notify every endpoint of one user
    ///
    /// Missing title or body fall back to the test notification text.
    pub async fn send_notification_to_x(
        &self,
        uid: &str,
        title: Option<&str>,
        body: Option<&str>,
    ) -> BackendResult<FanOutReport> {
        let payload = self
            .template
            .with_overrides(title.unwrap_or(DEFAULT_TITLE), body.unwrap_or(DEFAULT_BODY));

        let uids = BTreeSet::from([uid.to_string()]);
        let subscriptions = {
            let mut conn = self.pool.acquire().await?;
            db::subscriptions_for_uids(&mut conn, self.channel(), &uids).await?
        };

        Ok(self.fan_out(with_payload(subscriptions, &payload)).await)
    }

    /// Send the base payload to every registration of this channel
    pub async fn send_notification_all_user(&self) -> BackendResult<FanOutReport> {
        let payload = self.template.base();
        let subscriptions = {
            let mut conn = self.pool.acquire().await?;
            db::all_subscriptions(&mut conn, self.channel()).await?
        };

        Ok(self.fan_out(with_payload(subscriptions, &payload)).await)
    }

    /// Tell every member of a study group that someone joined
    pub async fn send_notification_group_study(&self, group_id: i64) -> BackendResult<FanOutReport> {
        let payload = self.template.with_overrides(GROUP_JOIN_TITLE, GROUP_JOIN_BODY);

        let subscriptions = {
            let mut conn = self.pool.acquire().await?;
            let members = group_member_uids(&mut conn, group_id).await?;
            if members.is_empty() {
                tracing::warn!("Study group {} has no members to notify", group_id);
            }
            db::subscriptions_for_uids(&mut conn, self.channel(), &members).await?
        };

        Ok(self.fan_out(with_payload(subscriptions, &payload)).await)
    }

    /// Send each attendee of the day's vote the result of their place
    ///
    /// Users who attended no open or dismissed place receive nothing.
    pub async fn send_notification_vote_result(&self, date: NaiveDate) -> BackendResult<FanOutReport> {
        let success = self.template.with_overrides(VOTE_SUCCESS_TITLE, VOTE_SUCCESS_BODY);
        let failure = self.template.with_overrides(VOTE_FAILURE_TITLE, VOTE_FAILURE_BODY);

        let (recipients, subscriptions) = {
            let mut conn = self.pool.acquire().await?;
            let participations = vote_participations(&mut conn, date).await?;
            let recipients = VoteRecipients::from_participations(&participations);
            if recipients.is_empty() {
                tracing::warn!("No attendees to notify for the vote on {}", date);
                return Ok(FanOutReport::default());
            }
            let uids: BTreeSet<String> = recipients
                .success()
                .union(recipients.failure())
                .cloned()
                .collect();
            let subscriptions = db::subscriptions_for_uids(&mut conn, self.channel(), &uids).await?;
            (recipients, subscriptions)
        };

        let deliveries = subscriptions
            .into_iter()
            .filter_map(|subscription| {
                let payload = match recipients.outcome_for(&subscription.uid)? {
                    VoteOutcome::Success => success.clone(),
                    VoteOutcome::Failure => failure.clone(),
                };
                Some((subscription, payload))
            })
            .collect();

        Ok(self.fan_out(deliveries).await)
    }

    /// Vote result for the current day in Seoul
    pub async fn send_notification_vote_result_today(&self) -> BackendResult<FanOutReport> {
        self.send_notification_vote_result(vote_date_at(Utc::now())).await
    }

    async fn fan_out(&self, deliveries: Vec<(NotificationSubscription, NotificationPayload)>) -> FanOutReport {
        let attempts = deliveries.iter().map(|(subscription, payload)| async move {
            let result = self.backend.deliver(subscription, payload).await;
            (subscription, result)
        });
        let results = join_all(attempts).await;

        let mut report = FanOutReport {
            attempted: results.len(),
            ..FanOutReport::default()
        };

        for (subscription, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    if e.is_gone() {
                        if self.prune(subscription).await {
                            report.pruned += 1;
                        }
                    } else {
                        tracing::warn!(
                            "{} push to {} failed: {:?}",
                            self.channel().as_str(),
                            subscription.uid,
                            e
                        );
                    }
                }
            }
        }

        tracing::debug!("{} fan-out finished: {:?}", self.channel().as_str(), report);
        report
    }

    async fn prune(&self, subscription: &NotificationSubscription) -> bool {
        let result = match self.pool.acquire().await {
            Ok(mut conn) => db::delete_subscription_by_id(&mut conn, subscription.id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!("Pruned gone endpoint of {}", subscription.uid);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to prune endpoint of {}: {:?}", subscription.uid, e);
                false
            }
        }
    }
}

fn with_payload(
    subscriptions: Vec<NotificationSubscription>,
    payload: &NotificationPayload,
) -> Vec<(NotificationSubscription, NotificationPayload)> {
    subscriptions
        .into_iter()
        .map(|subscription| (subscription, payload.clone()))
        .collect()
}
