use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storedash_pool::{EnvCredentials, PoolConfig};
use storedash_postgres::{AccessDirectory, DashboardService, PgConfig, StoreExecutor};
use storedash_server::{AppState, ServerArgs, ServerConfig, ServerError, StaticSessions, router};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config: ServerConfig = ServerArgs::parse().into();

    let pg = PgConfig::from_env()?;
    let executor = Arc::new(StoreExecutor::new(
        pg,
        Arc::new(EnvCredentials::new(config.credential_template.clone())),
        PoolConfig::builder()
            .idle_timeout(config.idle_timeout)
            .build(),
    ));

    let sessions = match std::env::var("STOREDASH_SESSIONS") {
        Ok(raw) => StaticSessions::from_pairs(&raw).map_err(ServerError::Config)?,
        Err(_) => StaticSessions::new(),
    };

    let state = AppState::new(
        Arc::new(DashboardService::new(executor.clone())),
        Arc::new(AccessDirectory::new(
            executor.clone(),
            config.directory_store,
        )),
        Arc::new(sessions),
    );

    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
