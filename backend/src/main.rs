//! Backend entry-point: loads settings, prepares the database and serves the
//! add-on API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ship_backend::inbound::http::health::HealthState;
use ship_backend::outbound::persistence::{DbPool, run_migrations};

use server::{ServerConfig, ShipSettings, create_server};

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ShipSettings::load().map_err(|e| startup_error("failed to load settings", e))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|e| startup_error("invalid settings", e))?;
    let addon = settings
        .addon_settings()
        .map_err(|e| startup_error("invalid settings", e))?;
    let secret_key = settings
        .secret_key()
        .map_err(|e| startup_error("invalid settings", e))?;
    let pool_config = settings
        .pool_config()
        .map_err(|e| startup_error("invalid settings", e))?;

    if settings.run_migrations {
        let applied = run_migrations(pool_config.database_url())
            .await
            .map_err(|e| startup_error("migrations failed", e))?;
        info!(applied, "database migrations applied");
    }

    let db_pool = DbPool::new(pool_config)
        .await
        .map_err(|e| startup_error("failed to create database pool", e))?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state,
        ServerConfig::new(bind_addr, db_pool, secret_key, addon),
    )?;
    info!(%bind_addr, "ship backend listening");
    server.await
}
