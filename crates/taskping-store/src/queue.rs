//! Reminder wake queue and the SQLite-backed scheduler.
//!
//! A queue row is the persisted form of a suspended workflow run. Rows are
//! pending until completed (reminder resolved) or failed (given up after
//! repeated dispatch errors). Suspensions shorter than the inline ceiling are
//! waited in-process instead of going through the table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use taskping_core::{Clock, ReminderTicket, ScheduleError, StorageError, Suspension, WakeScheduler};

use crate::store::SqliteStore;

/// Horizon up to which a suspension is waited in-process rather than
/// persisted. Anything longer must survive restarts, so it goes to the table.
pub const DEFAULT_INLINE_WAIT_CEILING: Duration = Duration::from_secs(30);

/// A pending or resolved wake queue row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderEntry {
    /// Database primary key.
    pub id: i64,
    /// Task to re-check at wake time.
    pub task_id: String,
    /// Client origin carried over from the assignment event.
    pub origin: Option<String>,
    /// When to wake.
    pub wake_at: DateTime<Utc>,
    /// Dispatch attempts made so far.
    pub attempts: i64,
    /// Error recorded by the most recent failed attempt.
    pub last_error: Option<String>,
    /// When the entry was enqueued.
    pub created_at: DateTime<Utc>,
}

impl ReminderEntry {
    /// The resumption ticket this entry persists.
    pub fn ticket(&self) -> ReminderTicket {
        ReminderTicket {
            task_id: self.task_id.clone(),
            origin: self.origin.clone(),
            wake_at: self.wake_at,
        }
    }
}

impl SqliteStore {
    /// Persist a wake entry for a deferred suspension.
    pub async fn enqueue_reminder(&self, ticket: &ReminderTicket) -> Result<i64, StorageError> {
        let id = sqlx::query(
            r#"
            INSERT INTO reminder_queue (task_id, origin, wake_at, created_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&ticket.task_id)
        .bind(&ticket.origin)
        .bind(ticket.wake_at)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::new("enqueue_reminder", e))?
        .last_insert_rowid();

        Ok(id)
    }

    /// Pending entries whose wake time has been reached, oldest wake first.
    pub async fn due_reminders(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ReminderEntry>, StorageError> {
        sqlx::query_as::<_, ReminderEntry>(
            r#"
            SELECT id, task_id, origin, wake_at, attempts, last_error, created_at
            FROM reminder_queue
            WHERE completed_at IS NULL AND failed_at IS NULL AND wake_at <= ?
            ORDER BY wake_at
            LIMIT ?
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::new("due_reminders", e))
    }

    /// Mark an entry resolved (reminder sent or legitimately skipped).
    pub async fn complete_reminder(&self, id: i64) -> Result<(), StorageError> {
        sqlx::query("UPDATE reminder_queue SET completed_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::new("complete_reminder", e))?;
        Ok(())
    }

    /// Record a failed dispatch attempt; the entry stays pending and is
    /// retried on a later tick. Returns the new attempt count.
    pub async fn record_reminder_failure(
        &self,
        id: i64,
        error: &str,
    ) -> Result<i64, StorageError> {
        sqlx::query(
            "UPDATE reminder_queue SET attempts = attempts + 1, last_error = ? WHERE id = ?",
        )
        .bind(error)
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::new("record_reminder_failure", e))?;

        let (attempts,): (i64,) =
            sqlx::query_as("SELECT attempts FROM reminder_queue WHERE id = ?")
                .bind(id)
                .fetch_one(self.pool())
                .await
                .map_err(|e| StorageError::new("record_reminder_failure", e))?;
        Ok(attempts)
    }

    /// Give up on an entry permanently. The last recorded error stays on the
    /// row for inspection.
    pub async fn abandon_reminder(&self, id: i64) -> Result<(), StorageError> {
        sqlx::query("UPDATE reminder_queue SET failed_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::new("abandon_reminder", e))?;
        Ok(())
    }
}

/// `WakeScheduler` backed by the reminder queue.
///
/// Short horizons never touch the table: the wait completes in-process and
/// the caller continues the run immediately. Long horizons persist a wake
/// entry and report [`Suspension::Deferred`]; the worker resumes them.
pub struct SqliteScheduler {
    store: SqliteStore,
    clock: Arc<dyn Clock>,
    inline_wait_ceiling: Duration,
}

impl SqliteScheduler {
    /// Create a scheduler with the default inline-wait ceiling.
    pub fn new(store: SqliteStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            inline_wait_ceiling: DEFAULT_INLINE_WAIT_CEILING,
        }
    }

    /// Override the inline-wait ceiling (tests use a zero ceiling to force
    /// deferral).
    pub fn with_inline_wait_ceiling(mut self, ceiling: Duration) -> Self {
        self.inline_wait_ceiling = ceiling;
        self
    }
}

#[async_trait::async_trait]
impl WakeScheduler for SqliteScheduler {
    async fn suspend_until(&self, ticket: &ReminderTicket) -> Result<Suspension, ScheduleError> {
        let delay = (ticket.wake_at - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        if delay <= self.inline_wait_ceiling {
            tokio::time::sleep(delay).await;
            return Ok(Suspension::Elapsed);
        }

        self.store
            .enqueue_reminder(ticket)
            .await
            .map_err(|e| ScheduleError::new("enqueue_reminder", e))?;
        Ok(Suspension::Deferred)
    }
}
