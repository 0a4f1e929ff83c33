// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Taskping Worker - the resumption half of the durable suspension.
//!
//! Deferred phase-2 suspensions live in the store's reminder wake queue. This
//! crate polls that queue and re-enters the workflow engine for every due
//! entry, so a reminder scheduled months ahead fires regardless of how many
//! times the process restarted in between.
//!
//! The worker can be embedded ([`runtime::WorkerRuntime`]) or run standalone
//! via the `taskping-worker` binary.

/// Worker configuration from environment variables.
pub mod config;

/// Embeddable worker runtime and the poll loop.
pub mod runtime;

pub use config::{Config, ConfigError, MailConfig};
pub use runtime::{WorkerRuntime, WorkerRuntimeBuilder};
