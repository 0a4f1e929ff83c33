// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP email provider transport.

use async_trait::async_trait;
use tracing::{debug, warn};

use taskping_core::{Mailer, NotificationPayload, TransportError};

/// Sends mail through a provider's HTTP messages endpoint.
///
/// The request is a form POST of `from`/`to`/`subject`/`html` with basic-auth
/// API-key credentials, the shape Mailgun-class providers accept.
pub struct HttpMailer {
    client: reqwest::Client,
    messages_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    /// Create a transport for a provider messages endpoint.
    ///
    /// `messages_url` is the full endpoint URL (e.g.
    /// `https://api.mailgun.net/v3/mg.example.com/messages`), `from` the
    /// sender address used for every message.
    pub fn new(
        messages_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            messages_url: messages_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), TransportError> {
        debug!(to = %payload.to, subject = %payload.subject, "dispatching email");

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from.as_str()),
                ("to", payload.to.as_str()),
                ("subject", payload.subject.as_str()),
                ("html", payload.body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %payload.to, status = %status, "email accepted by provider");
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        warn!(to = %payload.to, status = %status, "email dispatch failed");
        if status.is_server_error() {
            Err(TransportError::Unavailable(format!(
                "{}: {}",
                status, detail
            )))
        } else {
            Err(TransportError::Rejected(format!("{}: {}", status, detail)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> NotificationPayload {
        NotificationPayload {
            to: "alice@x.com".to_string(),
            subject: "New task assigned: Fix invoices".to_string(),
            body: "<p>Hi Alice,</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_form_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mg.example.com/messages"))
            .and(header_exists("authorization"))
            .and(body_string_contains("to=alice%40x.com"))
            .and(body_string_contains("subject=New+task+assigned"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mailer = HttpMailer::new(
            format!("{}/v3/mg.example.com/messages", mock_server.uri()),
            "key-secret",
            "Taskping <no-reply@mg.example.com>",
        );

        mailer.send(&payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let mailer = HttpMailer::new(mock_server.uri(), "wrong-key", "no-reply@x.com");
        let err = mailer.send(&payload()).await.unwrap_err();

        assert!(matches!(err, TransportError::Rejected(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let mailer = HttpMailer::new(mock_server.uri(), "key", "no-reply@x.com");
        let err = mailer.send(&payload()).await.unwrap_err();

        assert!(matches!(err, TransportError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        // Nothing listens on this port.
        let mailer = HttpMailer::new("http://127.0.0.1:9/messages", "key", "no-reply@x.com");
        let err = mailer.send(&payload()).await.unwrap_err();

        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}
