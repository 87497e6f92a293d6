//! Gatehouse daemon: connects the session store and sweeps expired
//! sessions on a fixed interval until interrupted.

mod config;

use std::process::ExitCode;
use std::time::Duration;

use gatehouse_auth::SessionService;
use gatehouse_db::{DbError, DbManager};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gatehouse=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting Gatehouse");

    match run().await {
        Ok(()) => {
            info!("Gatehouse stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Gatehouse failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load(std::env::args().nth(1))?;
    debug!(?config, "Configuration loaded");

    let db = DbManager::connect(&config.database).await?;
    db.migrate().await?;

    let service = SessionService::new(db.users(), db.sessions(), config.session.clone());

    let mut ticker = tokio::time::interval(Duration::from_secs(config.session.prune_interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => match service.prune_expired().await {
                Ok(0) => debug!("No expired sessions"),
                Ok(deleted) => info!(deleted, "Pruned expired sessions"),
                Err(e) => warn!(error = %e, "Expiry sweep failed"),
            },
            res = &mut shutdown => {
                res?;
                info!("Shutdown requested");
                return Ok(());
            }
        }
    }
}
