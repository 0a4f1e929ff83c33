// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task snapshot loading seam.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::TaskSnapshot;

/// Read-only access to task state.
///
/// Implementations must reflect the latest committed state at call time. The
/// workflow calls this twice per run (once per phase) and depends on the
/// second read being fresh; implementations must not cache across calls.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the current snapshot for a task.
    ///
    /// Returns `Ok(None)` when the task does not exist - the caller decides
    /// whether that is an error (phase 1) or a skip (phase 2).
    async fn load_task_snapshot(
        &self,
        task_id: &str,
    ) -> Result<Option<TaskSnapshot>, StorageError>;
}
