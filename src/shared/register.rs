//! Registration Data Structures
//!
//! A sign-up form waits for an administrator before it becomes a user
//! account: pending → approved | rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SharedError;

/// Status of a registration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(RegistrationStatus::Pending),
            "approved" => Some(RegistrationStatus::Approved),
            "rejected" => Some(RegistrationStatus::Rejected),
            _ => None,
        }
    }
}

/// Sign-up form submitted by a new user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub birth: String,
    #[serde(default)]
    pub gender: String,
    pub mbti: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub majors: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.name.trim().is_empty() {
            return Err(SharedError::validation("name", "Name is required"));
        }
        Ok(())
    }
}

/// A stored registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub uid: String,
    #[serde(flatten)]
    pub form: RegisterForm,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
