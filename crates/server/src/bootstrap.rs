use std::sync::Arc;

use axum::Router;
use flightbook_core::config::{AppConfig, ConfigError, LoadOptions};
use flightbook_core::gateway::NotificationChannel;
use flightbook_core::intents::IntentDispatcher;
use flightbook_db::{
    connect_with_settings, migrations, BlobStoreError, DbPool, FsBlobStore, SqlBookingRepository,
    StoreBackedGateway,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::fulfillment::{self, FulfillmentRouteState};
use crate::health;
use crate::notify::channel_from_config;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<IntentDispatcher>,
    pub notifier: Arc<dyn NotificationChannel>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("blob store initialization failed: {0}")]
    BlobStore(#[source] BlobStoreError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        timezone = %config.runtime.timezone,
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let blobs =
        FsBlobStore::new(&config.blob_store.root_dir).await.map_err(BootstrapError::BlobStore)?;
    info!(
        event_name = "system.bootstrap.blob_store_ready",
        correlation_id = "bootstrap",
        root_dir = %config.blob_store.root_dir.display(),
        key_prefix = %config.blob_store.key_prefix,
        "blob store ready"
    );

    let gateway = StoreBackedGateway::new(SqlBookingRepository::new(db_pool.clone()), blobs)
        .with_key_prefix(config.blob_store.key_prefix.clone());
    let notifier = channel_from_config(&config.notifications);
    let dispatcher = Arc::new(IntentDispatcher::book_flight(gateway, notifier.clone()));

    Ok(Application { config, db_pool, dispatcher, notifier })
}

impl Application {
    pub fn router(&self) -> Router {
        let fulfillment_state = FulfillmentRouteState {
            dispatcher: self.dispatcher.clone(),
            notifier: self.notifier.clone(),
            subject_prefix: self.config.notifications.subject_prefix.clone(),
        };

        health::router(self.db_pool.clone())
            .merge(fulfillment::router(fulfillment_state))
            .layer(TraceLayer::new_for_http())
    }
}
