//! SQLite-backed store and the snapshot read path.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::warn;

use taskping_core::{
    Assignee, ProjectRef, SnapshotStore, StorageError, TaskSnapshot, TaskStatus,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed persistence for taskping.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store from an existing pool. The caller is responsible for
    /// migrations (see [`SqliteStore::migrate`]).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create and initialize a store from a database file path.
    ///
    /// Creates parent directories and the database file if they don't exist,
    /// connects with sensible defaults and runs all embedded migrations.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::new("create_dir", format!("{:?}: {}", parent, e))
            })?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|e| StorageError::new("connect", format!("{:?}: {}", path, e)))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run all pending embedded migrations. Safe to call repeatedly.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::new("migrate", e))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Joined row backing a snapshot read. Assignee and project columns are all
/// nullable: the LEFT JOINs miss when the task is unassigned or orphaned.
#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: String,
    title: String,
    description: Option<String>,
    status: String,
    due_at: Option<DateTime<Utc>>,
    assignee_id: Option<String>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
}

impl SnapshotRow {
    fn into_snapshot(self) -> TaskSnapshot {
        let status = TaskStatus::parse(&self.status).unwrap_or_else(|| {
            // Unknown statuses come from schema drift upstream; the workflow
            // only distinguishes done-vs-not-done, so treat them as open.
            warn!(task_id = %self.id, status = %self.status, "unknown task status, treating as open");
            TaskStatus::Todo
        });

        let assignee = match (self.assignee_id, self.assignee_email) {
            (Some(id), Some(email)) => Some(Assignee {
                id,
                name: self.assignee_name,
                email,
            }),
            _ => None,
        };

        let project = match (self.project_id, self.project_name) {
            (Some(id), Some(name)) => Some(ProjectRef { id, name }),
            _ => None,
        };

        TaskSnapshot {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            due_at: self.due_at,
            assignee,
            project,
        }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for SqliteStore {
    async fn load_task_snapshot(
        &self,
        task_id: &str,
    ) -> Result<Option<TaskSnapshot>, StorageError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.due_at,
                   u.id AS assignee_id, u.name AS assignee_name, u.email AS assignee_email,
                   p.id AS project_id, p.name AS project_name
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assignee_id
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE t.id = ?
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::new("load_task_snapshot", e))?;

        Ok(row.map(SnapshotRow::into_snapshot))
    }
}
