// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Log-only transport for development.

use async_trait::async_trait;
use tracing::info;

use taskping_core::{Mailer, NotificationPayload, TransportError};

/// Logs every dispatch instead of sending it. Used when no provider
/// credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), TransportError> {
        info!(
            to = %payload.to,
            subject = %payload.subject,
            body_bytes = payload.body.len(),
            "email dispatch (log-only transport)"
        );
        Ok(())
    }
}
