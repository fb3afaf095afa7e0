/**
 * Server Initialization
 *
 * Builds the `AppState` the route layer serves from.
 *
 * # Initialization Process
 *
 * 1. Connect the SQLite pool (creating the database file if missing)
 * 2. Apply the migrations in `migrations/`
 * 3. Build the push backends; FCM only when configured
 * 4. Wire the services together
 *
 * Unlike optional integrations, the store is required: a connection or
 * migration failure is returned to the caller.
 */

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

use crate::backend::auth::SessionKeys;
use crate::backend::chat::ChatService;
use crate::backend::error::BackendResult;
use crate::backend::feed::FeedService;
use crate::backend::gift::GiftService;
use crate::backend::images::{ImageStore, LocalImageStore};
use crate::backend::log::LogService;
use crate::backend::push::{FcmBackend, Notifier, PushService, VapidSigner, WebPushBackend};
use crate::backend::register::RegisterService;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;

/// Install the global tracing subscriber
///
/// The filter comes from `RUST_LOG`, defaulting to `info` for this crate.
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("studyabout=info,sqlx=warn"));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Open the connection pool
pub async fn connect_pool(database_url: &str) -> BackendResult<SqlitePool> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> BackendResult<()> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Wire every service from a configuration and a ready pool
pub fn build_state(config: &ServerConfig, pool: SqlitePool) -> AppState {
    let client = reqwest::Client::new();

    let vapid = config.push.vapid.as_ref().and_then(|vapid| {
        VapidSigner::from_config(vapid)
            .map_err(|e| tracing::error!("VAPID keys unusable, sending without them: {:?}", e))
            .ok()
    });
    let web_push = PushService::new(
        pool.clone(),
        Arc::new(WebPushBackend::new(client.clone(), config.push.ttl, vapid)),
        config.push.template.clone(),
    );
    let fcm_backend = config
        .push
        .fcm
        .as_ref()
        .map(|fcm| FcmBackend::new(client.clone(), fcm));
    let fcm_token = fcm_backend.as_ref().map(FcmBackend::access_token);
    let fcm = fcm_backend.map(|backend| {
        PushService::new(pool.clone(), Arc::new(backend), config.push.template.clone())
    });
    let notifier = Notifier::new(web_push.clone(), fcm.clone());

    let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
        config.images.root.clone(),
        config.images.base_url.clone(),
    ));

    AppState {
        session_keys: SessionKeys::from_secret(&config.jwt_secret),
        feed: FeedService::new(pool.clone(), images),
        chat: ChatService::new(pool.clone(), notifier.clone()),
        web_push,
        fcm,
        fcm_token,
        notifier,
        gift: GiftService::new(pool.clone(), config.gift_ticket_cost),
        log: LogService::new(pool.clone()),
        register: RegisterService::new(pool.clone()),
        pool,
    }
}

/// Connect, migrate and build the application state
pub async fn init_state(config: &ServerConfig) -> BackendResult<AppState> {
    tracing::info!("Initializing studyabout services");

    let pool = connect_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let state = build_state(config, pool);
    tracing::info!(
        "Services ready (fcm {})",
        if state.fcm.is_some() { "enabled" } else { "disabled" }
    );
    Ok(state)
}
