// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Domain types for the assignment notification workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A task-assignment event, published by the trigger layer when a task is
/// created with an assignee or reassigned.
///
/// Consumed exactly once by the workflow; never persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEvent {
    /// Identifier of the assigned task.
    pub task_id: String,
    /// Base URL of the client application, used only for link rendering.
    #[serde(default)]
    pub origin: Option<String>,
    /// Explicit due-date override; takes precedence over the due date read
    /// from storage when deciding whether to schedule a reminder.
    #[serde(default)]
    pub due_override: Option<DateTime<Utc>>,
}

impl AssignmentEvent {
    /// Create an event for a task id with no origin and no due override.
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            origin: None,
            due_override: None,
        }
    }
}

/// Task completion status.
///
/// The workflow only ever branches on done-vs-not-done; the full set mirrors
/// the backing schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Completed.
    Done,
}

impl TaskStatus {
    /// Whether the task is complete. Reminders are suppressed for done tasks.
    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Parse the storage representation of a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Storage representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

/// The user a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// User identifier.
    pub id: String,
    /// Display name; greeting falls back to a generic form when absent.
    pub name: Option<String>,
    /// Notification recipient address.
    pub email: String,
}

/// The project a task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Project identifier.
    pub id: String,
    /// Project display name.
    pub name: String,
}

/// A point-in-time read of task state.
///
/// A snapshot with no assignee or no project is a valid terminal state for a
/// phase, not an error. Two snapshots of the same task taken at different
/// times may legitimately differ - the reminder phase exists to observe that
/// drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: String,
    /// Task title.
    pub title: String,
    /// Task description; renders as a stable placeholder when absent.
    pub description: Option<String>,
    /// Completion status at read time.
    pub status: TaskStatus,
    /// Due date at read time.
    pub due_at: Option<DateTime<Utc>>,
    /// Assignee at read time.
    pub assignee: Option<Assignee>,
    /// Owning project at read time.
    pub project: Option<ProjectRef>,
}

/// A rendered notification, ready for dispatch.
///
/// Constructed and consumed within a single workflow phase; never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Recipient email address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Rendered HTML body.
    pub body: String,
}

/// Named non-error outcomes. Distinguishable from `Sent` and from true errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The task has no assignee; there is nobody to notify.
    NoAssignee,
    /// No due date, or the due date is not strictly in the future.
    NoFutureDueDate,
    /// The task was completed before the reminder fired.
    AlreadyComplete,
    /// The task, its assignee or its project no longer resolve at reminder
    /// time - it may have been reassigned or deleted in the meantime.
    DataUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoAssignee => "no assignee",
            SkipReason::NoFutureDueDate => "no future due date",
            SkipReason::AlreadyComplete => "already complete",
            SkipReason::DataUnavailable => "task data unavailable",
        };
        f.write_str(reason)
    }
}

/// Outcome of a single workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// The notification was dispatched.
    Sent,
    /// The phase resolved without dispatching, for the given reason.
    Skipped(SkipReason),
}

/// Resolution of the reminder phase within a [`WorkflowRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOutcome {
    /// Phase 1 did not complete with `Sent`, so the reminder never ran.
    NotRun,
    /// The reminder was skipped without suspension (no future due date) or
    /// after resumption (task done, data gone).
    Skipped(SkipReason),
    /// The suspension was deferred to the durable wake queue; the worker
    /// resumes the run at `wake_at` or later.
    Scheduled {
        /// When the reminder phase will be re-evaluated.
        wake_at: DateTime<Utc>,
    },
    /// The reminder was dispatched.
    Sent,
}

impl From<PhaseOutcome> for ReminderOutcome {
    fn from(outcome: PhaseOutcome) -> Self {
        match outcome {
            PhaseOutcome::Sent => ReminderOutcome::Sent,
            PhaseOutcome::Skipped(reason) => ReminderOutcome::Skipped(reason),
        }
    }
}

/// Result of one workflow run for one assignment event.
///
/// A run is complete when both phases have resolved; a `Scheduled` reminder
/// resolves later, in the worker, independent of this process's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// The task the run was triggered for.
    pub task_id: String,
    /// Outcome of the immediate notification phase.
    pub immediate: PhaseOutcome,
    /// Resolution of the reminder phase.
    pub reminder: ReminderOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_parse_roundtrip() {
        for status in [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("ARCHIVED"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn test_task_status_is_done() {
        assert!(TaskStatus::Done.is_done());
        assert!(!TaskStatus::Todo.is_done());
        assert!(!TaskStatus::InProgress.is_done());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::NoAssignee.to_string(), "no assignee");
        assert_eq!(SkipReason::NoFutureDueDate.to_string(), "no future due date");
        assert_eq!(SkipReason::AlreadyComplete.to_string(), "already complete");
        assert_eq!(
            SkipReason::DataUnavailable.to_string(),
            "task data unavailable"
        );
    }

    #[test]
    fn test_reminder_outcome_from_phase_outcome() {
        assert_eq!(
            ReminderOutcome::from(PhaseOutcome::Sent),
            ReminderOutcome::Sent
        );
        assert_eq!(
            ReminderOutcome::from(PhaseOutcome::Skipped(SkipReason::AlreadyComplete)),
            ReminderOutcome::Skipped(SkipReason::AlreadyComplete)
        );
    }
}
