// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Email dispatch seam.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::NotificationPayload;

/// Outbound email transport.
///
/// Fire-and-confirm: a call either delivers the message to the provider or
/// fails with a [`TransportError`]. No partial or streaming semantics. Retry
/// policy belongs to the caller's substrate, never to implementations.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatch a rendered notification.
    async fn send(&self, payload: &NotificationPayload) -> Result<(), TransportError>;
}
