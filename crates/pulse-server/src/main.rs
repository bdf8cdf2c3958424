//! Server entry point for the Pulse social backend.
//!
//! Wires the `PostgreSQL` stores into the domain services, builds the
//! Axum application state, and serves the REST API.
//!
//! # Architecture
//!
//! ```text
//! HTTP (/api/v1) --> pulse-api handlers --> pulse-core services --> pulse-db stores --> PostgreSQL
//! ```

mod config;
mod error;

use std::sync::Arc;

use pulse_api::{AppState, Argon2Hasher, ServerConfig, start_server};
use pulse_core::repo::{ContentRepo, ConversationRepo, IdentityRepo, NotificationRepo};
use pulse_db::{
    ConversationStore, NotificationStore, PostStore, PostgresConfig, PostgresPool, UserStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// connects to `PostgreSQL`, runs migrations, then serves the API until
/// the process is terminated.
///
/// # Errors
///
/// Returns an error if initialization fails or the server stops with a
/// fatal error.
#[tokio::main]
async fn main() -> Result<(), error::ServerSetupError> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("pulse-server starting");

    let config = Config::from_env()?;
    info!(
        host = config.host,
        port = config.port,
        frontend_url = config.frontend_url.as_deref().unwrap_or("<permissive>"),
        "configuration loaded"
    );

    let db_config = PostgresConfig::new(&config.database_url)
        .with_max_connections(config.db_max_connections);
    let pool = PostgresPool::connect(&db_config).await?;
    pool.run_migrations().await?;

    let identities: Arc<dyn IdentityRepo> = Arc::new(UserStore::new(pool.pool().clone()));
    let content: Arc<dyn ContentRepo> = Arc::new(PostStore::new(pool.pool().clone()));
    let conversations: Arc<dyn ConversationRepo> =
        Arc::new(ConversationStore::new(pool.pool().clone()));
    let notifications: Arc<dyn NotificationRepo> =
        Arc::new(NotificationStore::new(pool.pool().clone()));

    let state = Arc::new(AppState::new(
        identities,
        content,
        conversations,
        notifications,
        Arc::new(Argon2Hasher),
        &config.jwt_secret,
    ));

    let server_config = ServerConfig {
        host: config.host,
        port: config.port,
        frontend_url: config.frontend_url,
    };

    start_server(&server_config, state).await?;

    pool.close().await;
    Ok(())
}
