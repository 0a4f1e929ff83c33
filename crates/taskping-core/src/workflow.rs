// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The assignment workflow engine.
//!
//! One run per assignment event, two ordered phases with a durable suspension
//! between them:
//!
//! 1. **Immediate** - validate the event, read the task, email the assignee.
//! 2. **Reminder** - only after a successful immediate send and only for a
//!    strictly-future due date: suspend until the due date, re-read the task,
//!    and email again unless it is done or its data no longer resolves.
//!
//! Phase 1 errors abort the run; phase 2 is never scheduled after one. A
//! phase 2 dispatch failure is reported on its own and does not invalidate
//! the already-sent immediate notification. The engine never retries a
//! dispatch - retry policy belongs to the substrate driving it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Result, WorkflowError};
use crate::mail::Mailer;
use crate::render::{NotificationKind, render};
use crate::schedule::{ReminderTicket, Suspension, WakeScheduler};
use crate::snapshots::SnapshotStore;
use crate::types::{
    AssignmentEvent, PhaseOutcome, ReminderOutcome, SkipReason, TaskSnapshot, WorkflowRun,
};

/// Orchestrates assignment notification runs over injected collaborators.
pub struct AssignmentWorkflow {
    snapshots: Arc<dyn SnapshotStore>,
    mailer: Arc<dyn Mailer>,
    scheduler: Arc<dyn WakeScheduler>,
    clock: Arc<dyn Clock>,
}

impl AssignmentWorkflow {
    /// Create an engine over the given collaborators.
    pub fn new(
        snapshots: Arc<dyn SnapshotStore>,
        mailer: Arc<dyn Mailer>,
        scheduler: Arc<dyn WakeScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            snapshots,
            mailer,
            scheduler,
            clock,
        }
    }

    /// Run the workflow for one assignment event.
    ///
    /// Returns the run result, with `ReminderOutcome::Scheduled` when the
    /// suspension was deferred to the wake queue - the worker then finishes
    /// the run via [`run_reminder`](Self::run_reminder).
    pub async fn run(&self, event: &AssignmentEvent) -> Result<WorkflowRun> {
        if event.task_id.trim().is_empty() {
            return Err(WorkflowError::Validation("missing task id"));
        }
        let task_id = event.task_id.clone();

        let snapshot = self
            .snapshots
            .load_task_snapshot(&task_id)
            .await?
            .ok_or_else(|| WorkflowError::TaskNotFound {
                task_id: task_id.clone(),
            })?;

        let Some(assignee) = snapshot.assignee.clone() else {
            info!(task_id = %task_id, "task has no assignee, nothing to notify");
            return Ok(WorkflowRun {
                task_id,
                immediate: PhaseOutcome::Skipped(SkipReason::NoAssignee),
                reminder: ReminderOutcome::NotRun,
            });
        };
        let Some(project) = snapshot.project.clone() else {
            return Err(WorkflowError::ProjectNotFound { task_id });
        };

        let payload = render(
            NotificationKind::Assignment,
            &snapshot,
            &assignee,
            &project,
            event.origin.as_deref(),
        )?;
        self.mailer.send(&payload).await?;
        info!(
            task_id = %task_id,
            recipient = %assignee.email,
            "assignment notification sent"
        );

        let reminder = self.schedule_reminder(event, &snapshot).await?;
        Ok(WorkflowRun {
            task_id,
            immediate: PhaseOutcome::Sent,
            reminder,
        })
    }

    /// Decide whether to enter the reminder phase, and run it inline when the
    /// suspension elapses in-process.
    async fn schedule_reminder(
        &self,
        event: &AssignmentEvent,
        snapshot: &TaskSnapshot,
    ) -> Result<ReminderOutcome> {
        // The event override wins over the due date read in phase 1.
        let Some(due_at) = event.due_override.or(snapshot.due_at) else {
            debug!(task_id = %snapshot.id, "no due date, reminder skipped");
            return Ok(ReminderOutcome::Skipped(SkipReason::NoFutureDueDate));
        };

        // Strictly-future policy: a due date equal to now does not fire.
        if due_at <= self.clock.now() {
            debug!(task_id = %snapshot.id, due_at = %due_at, "due date not in the future, reminder skipped");
            return Ok(ReminderOutcome::Skipped(SkipReason::NoFutureDueDate));
        }

        let ticket = ReminderTicket {
            task_id: snapshot.id.clone(),
            origin: event.origin.clone(),
            wake_at: due_at,
        };
        match self.scheduler.suspend_until(&ticket).await? {
            Suspension::Deferred => {
                info!(task_id = %ticket.task_id, wake_at = %due_at, "reminder deferred to wake queue");
                Ok(ReminderOutcome::Scheduled { wake_at: due_at })
            }
            Suspension::Elapsed => {
                let outcome = self.run_reminder(&ticket).await?;
                Ok(outcome.into())
            }
        }
    }

    /// Run the reminder phase for a resumed ticket.
    ///
    /// Called inline after an elapsed suspension, or by the worker for a
    /// deferred one. Reads task state fresh: everything decided in phase 1
    /// may have drifted since.
    pub async fn run_reminder(&self, ticket: &ReminderTicket) -> Result<PhaseOutcome> {
        let Some(snapshot) = self.snapshots.load_task_snapshot(&ticket.task_id).await? else {
            // Legitimately gone: the task may have been deleted since phase 1.
            info!(task_id = %ticket.task_id, "task vanished before reminder, skipped");
            return Ok(PhaseOutcome::Skipped(SkipReason::DataUnavailable));
        };
        let (Some(assignee), Some(project)) = (&snapshot.assignee, &snapshot.project) else {
            info!(task_id = %ticket.task_id, "task data incomplete at reminder time, skipped");
            return Ok(PhaseOutcome::Skipped(SkipReason::DataUnavailable));
        };

        if snapshot.status.is_done() {
            info!(task_id = %ticket.task_id, "task already complete, reminder skipped");
            return Ok(PhaseOutcome::Skipped(SkipReason::AlreadyComplete));
        }

        if snapshot.due_at.is_none() {
            // The due date was removed while we slept. The task is still open,
            // so remind anyway; the renderer copes with the missing date.
            warn!(task_id = %ticket.task_id, "due date removed since scheduling, sending reminder");
        }

        let payload = render(
            NotificationKind::Reminder,
            &snapshot,
            assignee,
            project,
            ticket.origin.as_deref(),
        )?;
        self.mailer.send(&payload).await?;
        info!(
            task_id = %ticket.task_id,
            recipient = %assignee.email,
            "reminder notification sent"
        );
        Ok(PhaseOutcome::Sent)
    }
}
