// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Durable suspension seam.
//!
//! The gap between the immediate notification and the reminder can span
//! anything from seconds to months, so the suspension must be a persisted
//! wake-up request that survives process restarts. Implementations may wait
//! short horizons in-process and defer long ones to a wake queue; the
//! [`Suspension`] result tells the engine which of the two happened.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// The state needed to resume a suspended run independently of process
/// lifetime: which task to re-check, when, and the origin URL for link
/// rendering. Tickets exist only for runs whose immediate phase sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTicket {
    /// Task to re-check at wake time.
    pub task_id: String,
    /// Client origin URL carried over from the assignment event.
    pub origin: Option<String>,
    /// The effective due date; resumption happens at or after this instant.
    pub wake_at: DateTime<Utc>,
}

/// How a suspension request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    /// The wake time was reached in-process; the caller continues now.
    Elapsed,
    /// The wake-up was persisted; the worker resumes the run at or after the
    /// wake time, and the caller must not continue the run itself.
    Deferred,
}

/// Durable suspend-until-timestamp.
#[async_trait]
pub trait WakeScheduler: Send + Sync {
    /// Suspend until `ticket.wake_at`.
    ///
    /// Must guarantee resumption at or after the wake time even across
    /// restarts: either by waiting in-process and returning
    /// [`Suspension::Elapsed`], or by persisting the ticket and returning
    /// [`Suspension::Deferred`].
    async fn suspend_until(&self, ticket: &ReminderTicket) -> Result<Suspension, ScheduleError>;
}
