//! Syncing server entry-point: loads settings, migrates the database and
//! serves the sync, revision and health endpoints.

mod server;

use actix_web::web;
use color_eyre::eyre::{WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use server::{ServerConfig, SyncServerSettings, create_server};
use syncing_server::inbound::http::health::HealthState;
use syncing_server::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        SyncServerSettings::load().map_err(|e| eyre!("failed to load settings: {e}"))?;
    let bind_addr = settings
        .bind_addr()
        .wrap_err("SYNCING_SERVER_BIND_ADDR is not a socket address")?;

    let mut config =
        ServerConfig::new(bind_addr).with_item_config(settings.item_service_config());

    if let Some(database_url) = settings.database_url.clone() {
        let migration_url = database_url.clone();
        tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
            .await
            .wrap_err("migration task panicked")??;

        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.database_max_connections),
        )
        .await
        .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    if let Some(raw_url) = settings.auth_server_url.as_deref() {
        let base_url = Url::parse(raw_url).wrap_err("SYNCING_SERVER_AUTH_SERVER_URL is invalid")?;
        config = config.with_auth_server(base_url, settings.auth_timeout());
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "syncing server listening");
    server.await?;
    Ok(())
}
