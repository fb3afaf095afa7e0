/**
 * Server Configuration
 *
 * This module loads the service configuration from environment variables
 * (optionally read from a `.env` file first).
 *
 * # Configuration Sources
 *
 * | Variable                  | Default                          |
 * |---------------------------|----------------------------------|
 * | `DATABASE_URL`            | `sqlite://studyabout.db`         |
 * | `JWT_SECRET`              | development secret (warns)       |
 * | `VAPID_SUBJECT`           | `mailto:admin@localhost`         |
 * | `VAPID_PUBLIC_KEY`        | unset (no VAPID header)          |
 * | `VAPID_PRIVATE_KEY`       | unset, PEM encoded P-256 key     |
 * | `PUSH_TTL`                | `2419200`                        |
 * | `FCM_PROJECT_ID`          | unset (FCM channel disabled)     |
 * | `FCM_ACCESS_TOKEN`        | empty, startup token only        |
 * | `FCM_BASE_URL`            | `https://fcm.googleapis.com`     |
 * | `IMAGE_ROOT`              | `./uploads`                      |
 * | `IMAGE_BASE_URL`          | `http://localhost:3000/uploads`  |
 * | `GIFT_TICKET_COST`        | `0` (redemptions are free)       |
 * | `NOTIFICATION_CLICK_URL`  | `http://localhost:3000/`         |
 * | `NOTIFICATION_ICON_URL`   | empty                            |
 * | `NOTIFICATION_BADGE_URL`  | empty                            |
 *
 * # Error Handling
 *
 * Missing values are logged and replaced by their defaults. Values that are
 * present but malformed (a non-numeric TTL) are also logged and defaulted,
 * so configuration loading itself never fails.
 */

use std::path::PathBuf;
use std::str::FromStr;

use crate::shared::notification::PayloadTemplate;

/// Default lifetime of a web-push message at the push service (28 days)
pub const DEFAULT_PUSH_TTL: u32 = 2_419_200;

const DEV_JWT_SECRET: &str = "studyabout-development-secret";

/// VAPID application server identity
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// `mailto:` or `https:` contact sent as the `sub` claim
    pub subject: String,
    /// Uncompressed P-256 public key, base64url, sent as `k=`
    pub public_key: String,
    /// PEM encoded P-256 private key used to sign the VAPID JWT
    pub private_key_pem: String,
}

/// Firebase Cloud Messaging HTTP v1 settings
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    /// Initial OAuth2 bearer token for the messaging scope. It expires; later
    /// tokens go through `AppState::fcm_token`.
    pub access_token: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub ttl: u32,
    pub vapid: Option<VapidConfig>,
    /// `None` disables the FCM channel entirely
    pub fcm: Option<FcmConfig>,
    pub template: PayloadTemplate,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub root: PathBuf,
    pub base_url: String,
}

/// Everything the services need at start-up
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub push: PushConfig,
    pub images: ImageConfig,
    /// Points charged per gift ticket
    pub gift_ticket_cost: i64,
}

impl ServerConfig {
    /// Load configuration from the environment
    ///
    /// Reads `.env` when present, then every variable listed in the module
    /// documentation.
    pub fn from_env() -> Self {
        if dotenv::dotenv().is_err() {
            tracing::debug!("No .env file found, using process environment only");
        }

        let database_url = env_or("DATABASE_URL", "sqlite://studyabout.db");

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set. Using the development secret.");
                DEV_JWT_SECRET.to_string()
            }
        };

        let vapid = match (
            std::env::var("VAPID_PUBLIC_KEY").ok(),
            std::env::var("VAPID_PRIVATE_KEY").ok(),
        ) {
            (Some(public_key), Some(private_key_pem)) => Some(VapidConfig {
                subject: env_or("VAPID_SUBJECT", "mailto:admin@localhost"),
                public_key,
                private_key_pem,
            }),
            _ => {
                tracing::warn!("VAPID keys not set. Web-push requests will be sent without authorization.");
                None
            }
        };

        let fcm = match std::env::var("FCM_PROJECT_ID") {
            Ok(project_id) if !project_id.is_empty() => {
                let access_token = env_or("FCM_ACCESS_TOKEN", "");
                if access_token.is_empty() {
                    tracing::warn!("FCM_ACCESS_TOKEN not set. FCM sends fail until a token is provided.");
                }
                Some(FcmConfig {
                    project_id,
                    access_token,
                    base_url: env_or("FCM_BASE_URL", "https://fcm.googleapis.com"),
                })
            }
            _ => {
                tracing::warn!("FCM_PROJECT_ID not set. FCM channel will be disabled.");
                None
            }
        };

        let template = PayloadTemplate {
            badge: env_or("NOTIFICATION_BADGE_URL", ""),
            icon: env_or("NOTIFICATION_ICON_URL", ""),
            url: env_or("NOTIFICATION_CLICK_URL", "http://localhost:3000/"),
        };

        Self {
            database_url,
            jwt_secret,
            push: PushConfig {
                ttl: parse_or("PUSH_TTL", DEFAULT_PUSH_TTL),
                vapid,
                fcm,
                template,
            },
            images: ImageConfig {
                root: PathBuf::from(env_or("IMAGE_ROOT", "./uploads")),
                base_url: env_or("IMAGE_BASE_URL", "http://localhost:3000/uploads"),
            },
            gift_ticket_cost: parse_or("GIFT_TICKET_COST", 0),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} is not valid ({:?}), using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
