//! Study Group and Vote Records
//!
//! These records belong to other parts of the application; the notification
//! fan-out only reads them to work out who should be told what.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Korea Standard Time (no daylight saving), the day boundary for votes
const SEOUL_UTC_OFFSET_HOURS: i64 = 9;

/// The vote date that contains `now` in Seoul time
pub fn vote_date_at(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(SEOUL_UTC_OFFSET_HOURS)).date_naive()
}

/// Status of one place in a day's vote
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Pending,
    /// The study at this place takes place
    Open,
    /// Not enough attendees; the study was called off
    Dismissed,
    Free,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "pending",
            ParticipationStatus::Open => "open",
            ParticipationStatus::Dismissed => "dismissed",
            ParticipationStatus::Free => "free",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ParticipationStatus::Pending),
            "open" => Some(ParticipationStatus::Open),
            "dismissed" => Some(ParticipationStatus::Dismissed),
            "free" => Some(ParticipationStatus::Free),
            _ => None,
        }
    }
}

/// One place in a day's vote together with the uids attending it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participation {
    pub id: Uuid,
    pub place: String,
    pub status: ParticipationStatus,
    pub attendees: Vec<String>,
}

/// Which result message a user should receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Success,
    Failure,
}

/// Recipients of a vote result, split into two disjoint sets
///
/// A uid is in at most one set. If a user attends both a dismissed and an
/// open place, the failure message wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteRecipients {
    success: BTreeSet<String>,
    failure: BTreeSet<String>,
}

impl VoteRecipients {
    pub fn from_participations(participations: &[Participation]) -> Self {
        let mut recipients = Self::default();
        for participation in participations {
            for uid in &participation.attendees {
                match participation.status {
                    ParticipationStatus::Dismissed => {
                        recipients.success.remove(uid);
                        recipients.failure.insert(uid.clone());
                    }
                    ParticipationStatus::Open => {
                        if !recipients.failure.contains(uid) {
                            recipients.success.insert(uid.clone());
                        }
                    }
                    ParticipationStatus::Pending | ParticipationStatus::Free => {}
                }
            }
        }
        recipients
    }

    pub fn outcome_for(&self, uid: &str) -> Option<VoteOutcome> {
        if self.failure.contains(uid) {
            Some(VoteOutcome::Failure)
        } else if self.success.contains(uid) {
            Some(VoteOutcome::Success)
        } else {
            None
        }
    }

    pub fn success(&self) -> &BTreeSet<String> {
        &self.success
    }

    pub fn failure(&self) -> &BTreeSet<String> {
        &self.failure
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.failure.is_empty()
    }
}
