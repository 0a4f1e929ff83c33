// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path or URL.
    pub database_url: String,
    /// How often the wake queue is polled.
    pub poll_interval: Duration,
    /// Maximum due entries drained per tick.
    pub reminder_batch: i64,
    /// Dispatch attempts before a reminder entry is abandoned.
    pub max_attempts: i64,
    /// Email provider credentials; absent means the log-only transport.
    pub mail: Option<MailConfig>,
}

/// Email provider settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Full messages endpoint URL.
    pub api_url: String,
    /// Provider API key.
    pub api_key: String,
    /// Sender address for every message.
    pub from: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `TASKPING_DATABASE_URL`: SQLite database path
    ///
    /// Optional (with defaults):
    /// - `TASKPING_POLL_INTERVAL_SECS`: wake queue poll interval (default: 30)
    /// - `TASKPING_REMINDER_BATCH`: max entries per tick (default: 32)
    /// - `TASKPING_MAX_ATTEMPTS`: dispatch attempts before giving up (default: 5)
    /// - `TASKPING_MAIL_API_URL`, `TASKPING_MAIL_API_KEY`, `TASKPING_MAIL_FROM`:
    ///   email provider settings; all three must be set together, otherwise
    ///   the worker falls back to the log-only transport
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("TASKPING_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("TASKPING_DATABASE_URL"))?;

        let poll_interval_secs: u64 = std::env::var("TASKPING_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("TASKPING_POLL_INTERVAL_SECS", "must be a positive integer")
            })?;

        let reminder_batch: i64 = std::env::var("TASKPING_REMINDER_BATCH")
            .unwrap_or_else(|_| "32".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("TASKPING_REMINDER_BATCH", "must be a positive integer")
            })?;

        let max_attempts: i64 = std::env::var("TASKPING_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("TASKPING_MAX_ATTEMPTS", "must be a positive integer")
            })?;

        let mail = match (
            std::env::var("TASKPING_MAIL_API_URL").ok(),
            std::env::var("TASKPING_MAIL_API_KEY").ok(),
            std::env::var("TASKPING_MAIL_FROM").ok(),
        ) {
            (Some(api_url), Some(api_key), Some(from)) => Some(MailConfig {
                api_url,
                api_key,
                from,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "TASKPING_MAIL_*",
                    "TASKPING_MAIL_API_URL, TASKPING_MAIL_API_KEY and TASKPING_MAIL_FROM must be set together",
                ));
            }
        };

        Ok(Self {
            database_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            reminder_batch,
            max_attempts,
            mail,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
