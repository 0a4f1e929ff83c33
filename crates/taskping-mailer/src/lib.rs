// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Taskping Mailer - outbound email transports.
//!
//! Two implementations of the core `Mailer` seam:
//!
//! - [`HttpMailer`]: posts messages to a hosted email provider's HTTP API
//!   (Mailgun-style form endpoint, API-key auth).
//! - [`LogMailer`]: logs instead of sending; the development and
//!   missing-credentials fallback.
//!
//! Neither transport retries. A failed dispatch is classified as `Rejected`
//! (the provider refused the message - retrying won't help) or `Unavailable`
//! (network or server trouble - the caller's substrate may retry).

pub mod http;
pub mod log;

pub use http::HttpMailer;
pub use log::LogMailer;
