// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Taskping Core - Assignment Notification Workflow Engine
//!
//! This crate implements the task-assignment notification workflow for a
//! project-management backend: when a task is assigned, the assignee gets an
//! immediate email, and - if the task carries a future due date - a reminder
//! email at that due date, sent only if the task is still incomplete by then.
//!
//! The workflow is a two-phase, resumable run per assignment event:
//!
//! ```text
//!  AssignmentEvent
//!        │
//!        ▼
//!  ┌───────────────────┐   snapshot    ┌──────────┐   payload   ┌────────┐
//!  │ Phase 1           │──────────────►│ Renderer │────────────►│ Mailer │
//!  │ immediate notify  │               └──────────┘             └────────┘
//!  └─────────┬─────────┘
//!            │ future due date?
//!            ▼
//!  ┌───────────────────┐
//!  │ suspend until due │  (durable - survives restarts via the wake queue)
//!  └─────────┬─────────┘
//!            │ wake
//!            ▼
//!  ┌───────────────────┐   fresh       ┌──────────┐             ┌────────┐
//!  │ Phase 2           │──────────────►│ Renderer │────────────►│ Mailer │
//!  │ reminder if still │   snapshot    └──────────┘             └────────┘
//!  │ incomplete        │
//!  └───────────────────┘
//! ```
//!
//! The engine is substrate-agnostic: storage, email transport, suspension and
//! the clock are injected behind traits ([`SnapshotStore`], [`Mailer`],
//! [`WakeScheduler`], [`Clock`]). The suspension between the phases is a
//! persisted wake-up request, never an in-memory timer - a deferred suspension
//! is resumed by the worker after any number of process restarts.
//!
//! Both phases read task state fresh from storage. The two reads of one run
//! are intentionally not linked: the entire point of the reminder phase is to
//! observe drift (the task may have been completed, reassigned or deleted
//! between the reads), so nothing here caches the first snapshot.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskping_core::{AssignmentEvent, AssignmentWorkflow, SystemClock};
//!
//! let workflow = AssignmentWorkflow::new(snapshots, mailer, scheduler, Arc::new(SystemClock));
//! let run = workflow.run(&AssignmentEvent::new("task-123")).await?;
//! match run.reminder {
//!     ReminderOutcome::Scheduled { wake_at } => { /* worker resumes later */ }
//!     _ => { /* run fully resolved */ }
//! }
//! ```

#![deny(missing_docs)]

/// Injectable wall clock.
pub mod clock;

/// Error taxonomy for workflow runs and collaborator failures.
pub mod error;

/// Email dispatch seam.
pub mod mail;

/// Notification rendering (assignment and reminder emails).
pub mod render;

/// Durable suspension seam and resumption tickets.
pub mod schedule;

/// Task snapshot loading seam.
pub mod snapshots;

/// Domain types: events, snapshots, payloads, run outcomes.
pub mod types;

/// The assignment workflow engine.
pub mod workflow;

pub use clock::{Clock, SystemClock};
pub use error::{
    RenderError, Result, ScheduleError, StorageError, TransportError, WorkflowError,
};
pub use mail::Mailer;
pub use render::{NotificationKind, render};
pub use schedule::{ReminderTicket, Suspension, WakeScheduler};
pub use snapshots::SnapshotStore;
pub use types::{
    AssignmentEvent, Assignee, NotificationPayload, PhaseOutcome, ProjectRef, ReminderOutcome,
    SkipReason, TaskSnapshot, TaskStatus, WorkflowRun,
};
pub use workflow::AssignmentWorkflow;
