// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Taskping Store - SQLite persistence.
//!
//! Three concerns live here:
//!
//! - **Task snapshots**: the [`SqliteStore`] implements the core
//!   `SnapshotStore` seam with a single joined read over tasks, users and
//!   projects.
//! - **Reminder wake queue**: the durable half of phase-2 suspension. Long
//!   suspensions become `reminder_queue` rows; the worker drains due rows.
//!   [`SqliteScheduler`] is the `WakeScheduler` implementation on top
//!   (in-process wait under a threshold, persisted wake entry above it).
//! - **Identity sync**: applies identity-provider webhook events
//!   (user created/updated/deleted) to the local `users` table.
//!
//! Schema migrations are embedded (`sqlx::migrate!`) and run automatically by
//! [`SqliteStore::from_path`].

pub mod identity;
pub mod queue;
pub mod store;

pub use identity::{IdentityEvent, UserPayload};
pub use queue::{ReminderEntry, SqliteScheduler, DEFAULT_INLINE_WAIT_CEILING};
pub use store::SqliteStore;
