//! Client credential lifecycle and authentication.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use tablegate_config::SecretCipher;
use tablegate_core::Client;
use tablegate_storage::ClientStore;

use crate::error::AuthError;

/// Directory of machine clients: creation with generated credentials and
/// secret verification for the token endpoint.
pub struct ClientDirectory {
    clients: Arc<dyn ClientStore>,
    cipher: SecretCipher,
}

impl ClientDirectory {
    pub fn new(clients: Arc<dyn ClientStore>, cipher: SecretCipher) -> Self {
        Self { clients, cipher }
    }

    /// Creates a client under an organization with a generated id and
    /// secret. The raw secret is returned exactly once; only the encrypted
    /// form is stored and it is never regenerated afterwards.
    pub async fn create_client(
        &self,
        organization_id: Uuid,
    ) -> Result<(Client, String), AuthError> {
        let client_id = Uuid::new_v4().to_string();
        let raw_secret = Uuid::new_v4().to_string();
        let encrypted = self
            .cipher
            .encrypt(&raw_secret)
            .map_err(|e| AuthError::internal(e.to_string()))?;

        let client = self
            .clients
            .create(Client {
                id: Uuid::new_v4(),
                client_id: client_id.clone(),
                client_secret: encrypted,
                organization_id,
            })
            .await?;

        info!(client_id = %client_id, organization_id = %organization_id, "Client created");
        Ok((client, raw_secret))
    }

    /// Resolves a client by id and verifies the supplied secret against the
    /// decrypted stored value (exact match).
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, AuthError> {
        let client = self
            .clients
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("Unknown client"))?;

        let stored_secret = match self.cipher.decrypt(&client.client_secret) {
            Ok(secret) => secret,
            Err(e) => {
                warn!(client_id = %client_id, error = %e, "Stored client secret unreadable");
                return Err(AuthError::invalid_client("Invalid client secret"));
            }
        };

        if stored_secret != client_secret {
            return Err(AuthError::invalid_client("Invalid client secret"));
        }

        Ok(client)
    }

    pub async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Client>, AuthError> {
        Ok(self.clients.list_by_organization(organization_id).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        Ok(self.clients.delete(id).await?)
    }
}
