// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error taxonomy for workflow runs.
//!
//! Skipped outcomes are not errors; they are carried in the result types
//! (`PhaseOutcome::Skipped`, `ReminderOutcome::Skipped`). Everything here is a
//! genuine failure of a run or of a collaborator.

use std::fmt;
use thiserror::Error;

/// Errors a workflow run can surface.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed or missing input to the workflow. Terminal, never retried.
    #[error("validation error: {0}")]
    Validation(&'static str),

    /// The referenced task does not exist at read time.
    #[error("task '{task_id}' not found")]
    TaskNotFound {
        /// The task id that failed to resolve.
        task_id: String,
    },

    /// The task exists but its project does not resolve during phase 1.
    #[error("project not found for task '{task_id}'")]
    ProjectNotFound {
        /// The task whose project failed to resolve.
        task_id: String,
    },

    /// Email dispatch failed. Surfaced for the substrate to retry; the engine
    /// itself never retries.
    #[error("email dispatch failed: {0}")]
    Transport(#[from] TransportError),

    /// Snapshot storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The durable suspension could not be recorded.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A notification template failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Email transport failures, split by retry class.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The provider accepted the connection but refused the message.
    #[error("message rejected by provider: {0}")]
    Rejected(String),

    /// The provider could not be reached or answered with a server error.
    /// This is the retryable class.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// A failure in the snapshot storage collaborator.
#[derive(Debug, Clone, Error)]
#[error("storage error during '{operation}': {details}")]
pub struct StorageError {
    /// The storage operation that failed.
    pub operation: &'static str,
    /// Failure details.
    pub details: String,
}

impl StorageError {
    /// Build a storage error from any displayable cause.
    pub fn new(operation: &'static str, cause: impl fmt::Display) -> Self {
        Self {
            operation,
            details: cause.to_string(),
        }
    }
}

/// A failure in the suspension collaborator.
#[derive(Debug, Clone, Error)]
#[error("schedule error during '{operation}': {details}")]
pub struct ScheduleError {
    /// The scheduling operation that failed.
    pub operation: &'static str,
    /// Failure details.
    pub details: String,
}

impl ScheduleError {
    /// Build a schedule error from any displayable cause.
    pub fn new(operation: &'static str, cause: impl fmt::Display) -> Self {
        Self {
            operation,
            details: cause.to_string(),
        }
    }
}

/// A notification template failed to parse or render.
#[derive(Debug, Clone, Error)]
#[error("render error in '{template}': {details}")]
pub struct RenderError {
    /// The template that failed.
    pub template: &'static str,
    /// Failure details.
    pub details: String,
}

impl RenderError {
    /// Build a render error from any displayable cause.
    pub fn new(template: &'static str, cause: impl fmt::Display) -> Self {
        Self {
            template,
            details: cause.to_string(),
        }
    }
}

/// Type alias for workflow results.
pub type Result<T> = std::result::Result<T, WorkflowError>;
