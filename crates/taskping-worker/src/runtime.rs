// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable worker runtime.
//!
//! [`WorkerRuntime`] owns the reminder poll loop: every tick it drains due
//! wake entries and re-enters the workflow engine for each one. It can be
//! embedded in an existing tokio application instead of running the
//! standalone binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskping_worker::runtime::WorkerRuntime;
//!
//! let runtime = WorkerRuntime::builder()
//!     .store(store)
//!     .mailer(mailer)
//!     .start()
//!     .await?;
//!
//! // ... run your application ...
//!
//! runtime.shutdown().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use taskping_core::{
    AssignmentWorkflow, Clock, Mailer, PhaseOutcome, SystemClock, WorkflowError,
};
use taskping_store::{SqliteScheduler, SqliteStore};

/// Builder for creating a [`WorkerRuntime`].
pub struct WorkerRuntimeBuilder {
    store: Option<SqliteStore>,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    reminder_batch: i64,
    max_attempts: i64,
}

impl Default for WorkerRuntimeBuilder {
    fn default() -> Self {
        Self {
            store: None,
            mailer: None,
            clock: Arc::new(SystemClock),
            poll_interval: Duration::from_secs(30),
            reminder_batch: 32,
            max_attempts: 5,
        }
    }
}

impl WorkerRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store (required).
    pub fn store(mut self, store: SqliteStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the email transport (required).
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Override the clock (tests pin time).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the wake queue poll interval. Default: 30s.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the maximum due entries drained per tick. Default: 32.
    pub fn reminder_batch(mut self, batch: i64) -> Self {
        self.reminder_batch = batch;
        self
    }

    /// Set the dispatch attempts before an entry is abandoned. Default: 5.
    pub fn max_attempts(mut self, attempts: i64) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Start the runtime, spawning the poll loop task.
    pub async fn start(self) -> Result<WorkerRuntime> {
        let store = self
            .store
            .ok_or_else(|| anyhow::anyhow!("store is required"))?;
        let mailer = self
            .mailer
            .ok_or_else(|| anyhow::anyhow!("mailer is required"))?;

        let scheduler = Arc::new(SqliteScheduler::new(store.clone(), self.clock.clone()));
        let workflow = Arc::new(AssignmentWorkflow::new(
            Arc::new(store.clone()),
            mailer,
            scheduler,
            self.clock.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let loop_handle = tokio::spawn(run_poll_loop(
            store,
            workflow.clone(),
            self.clock.clone(),
            self.poll_interval,
            self.reminder_batch,
            self.max_attempts,
            shutdown_rx,
        ));

        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "WorkerRuntime started"
        );

        Ok(WorkerRuntime {
            loop_handle,
            shutdown_tx,
            workflow,
        })
    }
}

/// A running worker that can be embedded in an application.
pub struct WorkerRuntime {
    loop_handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    workflow: Arc<AssignmentWorkflow>,
}

impl std::fmt::Debug for WorkerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRuntime")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl WorkerRuntime {
    /// Create a new builder for configuring the runtime.
    pub fn builder() -> WorkerRuntimeBuilder {
        WorkerRuntimeBuilder::new()
    }

    /// The workflow engine wired to this worker's store, mailer and wake
    /// queue. Trigger layers use this to start runs for assignment events.
    pub fn workflow(&self) -> Arc<AssignmentWorkflow> {
        self.workflow.clone()
    }

    /// Check if the poll loop is still running.
    pub fn is_running(&self) -> bool {
        !self.loop_handle.is_finished()
    }

    /// Gracefully shut down: the current tick finishes, then the loop exits.
    pub async fn shutdown(self) -> Result<()> {
        info!("WorkerRuntime shutting down...");
        let _ = self.shutdown_tx.send(true);

        match self.loop_handle.await {
            Ok(()) => {
                info!("WorkerRuntime shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!("WorkerRuntime poll loop panicked: {}", e);
                Err(anyhow::anyhow!("poll loop panicked: {}", e))
            }
        }
    }
}

/// The reminder poll loop.
async fn run_poll_loop(
    store: SqliteStore,
    workflow: Arc<AssignmentWorkflow>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    reminder_batch: i64,
    max_attempts: i64,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("poll loop received shutdown signal");
                    break;
                }
            }

            _ = ticker.tick() => {
                if let Err(e) =
                    drain_due_reminders(&store, &workflow, clock.now(), reminder_batch, max_attempts).await
                {
                    // Storage trouble is tick-scoped; the next tick retries.
                    error!("reminder tick failed: {}", e);
                }
            }
        }
    }

    info!("poll loop stopped");
}

/// Drain one batch of due wake entries. Returns the number of entries that
/// reached a terminal state this tick.
pub async fn drain_due_reminders(
    store: &SqliteStore,
    workflow: &AssignmentWorkflow,
    now: chrono::DateTime<chrono::Utc>,
    batch: i64,
    max_attempts: i64,
) -> Result<usize, WorkflowError> {
    let due = store.due_reminders(now, batch).await?;
    if due.is_empty() {
        return Ok(0);
    }
    info!(count = due.len(), "draining due reminders");

    let mut resolved = 0;
    for entry in due {
        let ticket = entry.ticket();
        match workflow.run_reminder(&ticket).await {
            Ok(PhaseOutcome::Sent) => {
                store.complete_reminder(entry.id).await?;
                info!(task_id = %ticket.task_id, "reminder sent");
                resolved += 1;
            }
            Ok(PhaseOutcome::Skipped(reason)) => {
                store.complete_reminder(entry.id).await?;
                info!(task_id = %ticket.task_id, reason = %reason, "reminder skipped");
                resolved += 1;
            }
            Err(e) => {
                // The immediate notification already went out; this failure
                // only concerns the reminder and is retried on later ticks.
                let attempts = store
                    .record_reminder_failure(entry.id, &e.to_string())
                    .await?;
                if attempts >= max_attempts {
                    store.abandon_reminder(entry.id).await?;
                    error!(
                        task_id = %ticket.task_id,
                        attempts,
                        "reminder abandoned after repeated failures: {}", e
                    );
                    resolved += 1;
                } else {
                    warn!(
                        task_id = %ticket.task_id,
                        attempts,
                        "reminder dispatch failed, will retry: {}", e
                    );
                }
            }
        }
    }
    Ok(resolved)
}
