// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Identity-provider webhook sync.
//!
//! The upstream identity provider is the source of truth for users; it pushes
//! created/updated/deleted webhooks which the API layer forwards here as
//! [`IdentityEvent`]s. Only fields present on an update are written - an
//! absent field means "unchanged", not "clear".

use serde::Deserialize;
use tracing::info;

use taskping_core::StorageError;

use crate::store::SqliteStore;

/// User fields as delivered by the identity provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    /// Provider-assigned user id.
    pub id: String,
    /// Primary email address. Required on create.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserPayload {
    /// Assemble the display name: "first last" trimmed; empty becomes None.
    fn display_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        (!name.is_empty()).then_some(name)
    }
}

/// A user lifecycle event from the identity provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum IdentityEvent {
    /// A user signed up.
    UserCreated(UserPayload),
    /// A user changed profile data.
    UserUpdated(UserPayload),
    /// A user was removed.
    UserDeleted {
        /// Provider-assigned user id.
        id: String,
    },
}

impl SqliteStore {
    /// Apply one identity event to the local `users` table.
    pub async fn apply_identity_event(&self, event: &IdentityEvent) -> Result<(), StorageError> {
        match event {
            IdentityEvent::UserCreated(user) => self.create_user(user).await,
            IdentityEvent::UserUpdated(user) => self.update_user(user).await,
            IdentityEvent::UserDeleted { id } => self.delete_user(id).await,
        }
    }

    async fn create_user(&self, user: &UserPayload) -> Result<(), StorageError> {
        if user.id.is_empty() {
            return Err(StorageError::new("create_user", "user id is missing"));
        }
        let Some(email) = user.email.as_deref() else {
            return Err(StorageError::new("create_user", "email address is missing"));
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&user.id)
        .bind(email)
        .bind(user.display_name())
        .bind(&user.image_url)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::new("create_user", e))?;

        info!(user_id = %user.id, "user created from identity webhook");
        Ok(())
    }

    async fn update_user(&self, user: &UserPayload) -> Result<(), StorageError> {
        if user.id.is_empty() {
            return Err(StorageError::new("update_user", "user id is missing"));
        }

        // COALESCE keeps the stored value for fields the webhook left out.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE(?, email),
                name = COALESCE(?, name),
                image_url = COALESCE(?, image_url),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(user.display_name())
        .bind(&user.image_url)
        .bind(&user.id)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::new("update_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::new("update_user", "no such user"));
        }

        info!(user_id = %user.id, "user updated from identity webhook");
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), StorageError> {
        if id.is_empty() {
            return Err(StorageError::new("delete_user", "user id is missing"));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::new("delete_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::new("delete_user", "no such user"));
        }

        info!(user_id = %id, "user deleted from identity webhook");
        Ok(())
    }
}
