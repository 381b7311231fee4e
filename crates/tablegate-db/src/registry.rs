//! Connection registry: CRUD over connection descriptors with encryption
//! at the write boundary, plus connection testing.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use tablegate_config::SecretCipher;
use tablegate_core::DbConnectionDescriptor;
use tablegate_storage::ConnectionStore;

use crate::error::{DbError, Result};
use crate::hub::ConnectionHub;
use crate::pool::{connect_url, ping};

/// Explicit password-change indicator for descriptor writes.
///
/// The write contract distinguishes "operator left the field untouched"
/// from "operator set this plaintext", so a stored ciphertext is never
/// mistaken for a new password (or re-encrypted).
#[derive(Debug, Clone)]
pub enum PasswordInput {
    Unchanged,
    Set(String),
}

/// Service wrapping the connection store with credential handling and
/// cache invalidation.
pub struct ConnectionRegistry {
    store: Arc<dyn ConnectionStore>,
    cipher: SecretCipher,
    hub: Arc<ConnectionHub>,
}

impl ConnectionRegistry {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        cipher: SecretCipher,
        hub: Arc<ConnectionHub>,
    ) -> Self {
        Self { store, cipher, hub }
    }

    /// Persists a new descriptor. A provided password is encrypted before
    /// it reaches the store; the plaintext is never persisted.
    pub async fn create(
        &self,
        mut descriptor: DbConnectionDescriptor,
        password: PasswordInput,
    ) -> Result<DbConnectionDescriptor> {
        descriptor.password = self.encrypted_password(password, None)?;
        let stored = self.store.create(descriptor).await?;
        info!(connection_id = %stored.id, name = %stored.name, "Connection created");
        Ok(stored)
    }

    /// Updates a descriptor and invalidates its cached resource so the next
    /// use rebuilds with the new settings.
    pub async fn update(
        &self,
        mut descriptor: DbConnectionDescriptor,
        password: PasswordInput,
    ) -> Result<DbConnectionDescriptor> {
        let existing = self
            .store
            .get(descriptor.id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("connection not found: {}", descriptor.id)))?;

        descriptor.password = self.encrypted_password(password, Some(&existing.password))?;
        let stored = self.store.update(descriptor).await?;
        self.hub.invalidate(stored.id).await;
        info!(connection_id = %stored.id, name = %stored.name, "Connection updated");
        Ok(stored)
    }

    /// Deletes a descriptor (the store cascades its API definitions) and
    /// releases any cached resource.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        self.hub.invalidate(id).await;
        info!(connection_id = %id, "Connection deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<DbConnectionDescriptor>> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<DbConnectionDescriptor>> {
        Ok(self.store.list().await?)
    }

    /// Attempts a short-lived connection with the descriptor's credentials.
    /// Failures are logged and collapsed to `false`; this never errors.
    pub async fn test_connection(&self, descriptor: &DbConnectionDescriptor) -> bool {
        let password = if descriptor.password.is_empty() {
            String::new()
        } else {
            match self.cipher.decrypt(&descriptor.password) {
                Ok(p) => p,
                Err(e) => {
                    warn!(connection = %descriptor.name, error = %e, "Password decryption failed");
                    return false;
                }
            }
        };

        let url = match connect_url(descriptor, &password) {
            Ok(url) => url,
            Err(e) => {
                warn!(connection = %descriptor.name, error = %e, "Invalid connection URL");
                return false;
            }
        };

        match ping(&url).await {
            Ok(()) => true,
            Err(e) => {
                warn!(connection = %descriptor.name, error = %e, "Connection test failed");
                false
            }
        }
    }

    fn encrypted_password(
        &self,
        input: PasswordInput,
        existing: Option<&str>,
    ) -> Result<String> {
        match input {
            PasswordInput::Set(raw) if !raw.is_empty() => {
                self.cipher.encrypt(&raw).map_err(DbError::credential)
            }
            PasswordInput::Set(_) => Ok(String::new()),
            PasswordInput::Unchanged => Ok(existing.unwrap_or_default().to_string()),
        }
    }
}
