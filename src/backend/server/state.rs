/**
 * Application State Management
 *
 * `AppState` holds one instance of every service plus the session keys. The
 * services are stateless apart from cheap shared handles (the pool, `Arc`ed
 * backends), so cloning the state per request is cheap.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers ask for just the service they
 * use, and let the `AuthUser` extractor find the session keys.
 *
 * ```rust,ignore
 * async fn handler(AuthUser(caller): AuthUser, State(feeds): State<FeedService>) {
 *     let page = feeds.find_all_feeds(&caller, FeedPage::default()).await;
 * }
 * ```
 */

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::backend::auth::SessionKeys;
use crate::backend::chat::ChatService;
use crate::backend::feed::FeedService;
use crate::backend::gift::GiftService;
use crate::backend::log::LogService;
use crate::backend::push::{FcmAccessToken, Notifier, PushService};
use crate::backend::register::RegisterService;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub session_keys: SessionKeys,
    pub feed: FeedService,
    pub chat: ChatService,
    pub web_push: PushService,
    /// `None` when FCM is not configured
    pub fcm: Option<PushService>,
    /// Refresh handle for the FCM bearer token
    pub fcm_token: Option<FcmAccessToken>,
    pub notifier: Notifier,
    pub gift: GiftService,
    pub log: LogService,
    pub register: RegisterService,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_keys.clone()
    }
}

impl FromRef<AppState> for FeedService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.feed.clone()
    }
}

impl FromRef<AppState> for ChatService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.chat.clone()
    }
}

impl FromRef<AppState> for Notifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notifier.clone()
    }
}

impl FromRef<AppState> for GiftService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gift.clone()
    }
}

impl FromRef<AppState> for LogService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.log.clone()
    }
}

impl FromRef<AppState> for RegisterService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.register.clone()
    }
}
