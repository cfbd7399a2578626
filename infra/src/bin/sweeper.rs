//! Scheduled retention sweep for the refresh token table
//!
//! Runs the sweep on the configured interval until interrupted. Pass
//! `--once` to run a single sweep and exit, e.g. from an external cron.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use rt_core::services::RetentionSweeper;
use rt_infra::database::{DatabasePool, MySqlTokenStore};
use rt_infra::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = rt_infra::load_config().context("failed to load configuration")?;
    init_logging(&config.logging).context("failed to initialise logging")?;

    if config.environment.is_production() && config.session.is_using_default_secret() {
        bail!("refusing to start in production with the development refresh token secret");
    }
    if let Err(message) = config.retention.validate() {
        bail!("invalid retention configuration: {}", message);
    }

    let run_once = std::env::args().any(|arg| arg == "--once");

    info!(environment = %config.environment, "Starting refresh token sweeper");
    if !config.environment.is_production() && config.database.is_remote() {
        warn!(environment = %config.environment, "Sweeping a remote token database outside production");
    }

    let pool = DatabasePool::new(config.database.clone())
        .await
        .context("failed to connect to the token database")?;
    if config.database.run_migrations {
        pool.run_migrations().await.context("failed to run migrations")?;
    }
    info!("{}", pool.get_statistics());

    let store = Arc::new(MySqlTokenStore::new(pool.get_pool().clone()));
    let sweeper = Arc::new(RetentionSweeper::new(store, config.retention.clone()));

    if run_once {
        let report = sweeper.run_sweep().await;
        pool.close().await;
        if !report.is_success() {
            bail!("sweep finished with errors: {:?}", report.errors);
        }
        return Ok(());
    }

    let Some(handle) = sweeper.start() else {
        warn!("Sweeping is disabled by configuration, exiting");
        pool.close().await;
        return Ok(());
    };

    let abort = handle.abort_handle();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
            abort.abort();
        }
        result = handle => {
            // The loop only ends if the task panicked
            result.context("sweeper task terminated")?;
        }
    }

    pool.close().await;
    info!("Refresh token sweeper stopped");
    Ok(())
}
