// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Taskping Worker binary.
//!
//! Runs the reminder poll loop against the configured store until ctrl-c.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use taskping_core::Mailer;
use taskping_mailer::{HttpMailer, LogMailer};
use taskping_store::SqliteStore;
use taskping_worker::config::Config;
use taskping_worker::runtime::WorkerRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from crate directory or parent directories)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskping_worker=info".parse().unwrap()),
        )
        .init();

    info!("Starting Taskping Worker");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        database_url = %config.database_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        reminder_batch = config.reminder_batch,
        "Configuration loaded"
    );

    let store = SqliteStore::from_path(&config.database_url).await?;
    info!("Database ready, migrations applied");

    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail) => {
            info!(from = %mail.from, "Using HTTP email transport");
            Arc::new(HttpMailer::new(
                mail.api_url.clone(),
                mail.api_key.clone(),
                mail.from.clone(),
            ))
        }
        None => {
            info!("No mail credentials configured, using log-only transport");
            Arc::new(LogMailer)
        }
    };

    let runtime = WorkerRuntime::builder()
        .store(store)
        .mailer(mailer)
        .poll_interval(config.poll_interval)
        .reminder_batch(config.reminder_batch)
        .max_attempts(config.max_attempts)
        .start()
        .await?;

    info!("Taskping Worker running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    runtime.shutdown().await?;
    info!("Shutdown complete");

    Ok(())
}
