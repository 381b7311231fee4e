//! In-memory metadata store.
//!
//! Backing maps are insertion-ordered (`IndexMap`), so `list` and the
//! first-match lookups behave deterministically under test and in single
//! process deployments. Cascade rules live here: deleting a connection
//! removes its definitions, deleting an organization removes its clients.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use tablegate_core::{ApiDefinition, ApiType, Client, DbConnectionDescriptor, Organization};

use crate::error::StorageError;
use crate::traits::{ApiDefinitionStore, ClientStore, ConnectionStore, OrganizationStore};

/// Process-local implementation of all four metadata store traits.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    connections: RwLock<IndexMap<Uuid, DbConnectionDescriptor>>,
    definitions: RwLock<IndexMap<Uuid, ApiDefinition>>,
    organizations: RwLock<IndexMap<Uuid, Organization>>,
    clients: RwLock<IndexMap<Uuid, Client>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionStore for MemoryMetadataStore {
    async fn create(
        &self,
        descriptor: DbConnectionDescriptor,
    ) -> Result<DbConnectionDescriptor, StorageError> {
        let mut connections = self.connections.write().await;
        if connections.contains_key(&descriptor.id) {
            return Err(StorageError::conflict("connection", descriptor.id));
        }
        connections.insert(descriptor.id, descriptor.clone());
        Ok(descriptor)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DbConnectionDescriptor>, StorageError> {
        Ok(self.connections.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<DbConnectionDescriptor>, StorageError> {
        Ok(self.connections.read().await.values().cloned().collect())
    }

    async fn update(
        &self,
        descriptor: DbConnectionDescriptor,
    ) -> Result<DbConnectionDescriptor, StorageError> {
        let mut connections = self.connections.write().await;
        if !connections.contains_key(&descriptor.id) {
            return Err(StorageError::not_found("connection", descriptor.id));
        }
        connections.insert(descriptor.id, descriptor.clone());
        Ok(descriptor)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        {
            let mut connections = self.connections.write().await;
            if connections.shift_remove(&id).is_none() {
                return Err(StorageError::not_found("connection", id));
            }
        }
        // Cascade: definitions owned by this connection go with it.
        let removed = ApiDefinitionStore::delete_by_connection(self, id).await?;
        if removed > 0 {
            tracing::debug!(connection_id = %id, removed, "Cascade-deleted API definitions");
        }
        Ok(())
    }
}

#[async_trait]
impl ApiDefinitionStore for MemoryMetadataStore {
    async fn create(&self, definition: ApiDefinition) -> Result<ApiDefinition, StorageError> {
        let mut definitions = self.definitions.write().await;
        if definitions.contains_key(&definition.id) {
            return Err(StorageError::conflict("api definition", definition.id));
        }
        definitions.insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ApiDefinition>, StorageError> {
        Ok(self.definitions.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ApiDefinition>, StorageError> {
        Ok(self.definitions.read().await.values().cloned().collect())
    }

    async fn list_by_type(&self, api_type: ApiType) -> Result<Vec<ApiDefinition>, StorageError> {
        Ok(self
            .definitions
            .read()
            .await
            .values()
            .filter(|d| d.api_type == api_type)
            .cloned()
            .collect())
    }

    async fn find_by_table(
        &self,
        table_name: &str,
        api_type: ApiType,
    ) -> Result<Option<ApiDefinition>, StorageError> {
        Ok(self
            .definitions
            .read()
            .await
            .values()
            .find(|d| d.matches(table_name, api_type))
            .cloned())
    }

    async fn update(&self, definition: ApiDefinition) -> Result<ApiDefinition, StorageError> {
        let mut definitions = self.definitions.write().await;
        if !definitions.contains_key(&definition.id) {
            return Err(StorageError::not_found("api definition", definition.id));
        }
        definitions.insert(definition.id, definition.clone());
        Ok(definition)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let mut definitions = self.definitions.write().await;
        if definitions.shift_remove(&id).is_none() {
            return Err(StorageError::not_found("api definition", id));
        }
        Ok(())
    }

    async fn delete_by_connection(&self, connection_id: Uuid) -> Result<usize, StorageError> {
        let mut definitions = self.definitions.write().await;
        let before = definitions.len();
        definitions.retain(|_, d| d.connection_id != connection_id);
        Ok(before - definitions.len())
    }
}

#[async_trait]
impl OrganizationStore for MemoryMetadataStore {
    async fn create(&self, organization: Organization) -> Result<Organization, StorageError> {
        let mut organizations = self.organizations.write().await;
        if organizations.contains_key(&organization.id) {
            return Err(StorageError::conflict("organization", organization.id));
        }
        organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Organization>, StorageError> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Organization>, StorageError> {
        Ok(self.organizations.read().await.values().cloned().collect())
    }

    async fn update(&self, organization: Organization) -> Result<Organization, StorageError> {
        let mut organizations = self.organizations.write().await;
        if !organizations.contains_key(&organization.id) {
            return Err(StorageError::not_found("organization", organization.id));
        }
        organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        {
            let mut organizations = self.organizations.write().await;
            if organizations.shift_remove(&id).is_none() {
                return Err(StorageError::not_found("organization", id));
            }
        }
        // Cascade: clients belong to exactly one organization.
        let removed = ClientStore::delete_by_organization(self, id).await?;
        if removed > 0 {
            tracing::debug!(organization_id = %id, removed, "Cascade-deleted clients");
        }
        Ok(())
    }
}

#[async_trait]
impl ClientStore for MemoryMetadataStore {
    async fn create(&self, client: Client) -> Result<Client, StorageError> {
        let mut clients = self.clients.write().await;
        if clients.contains_key(&client.id) {
            return Err(StorageError::conflict("client", client.id));
        }
        clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Client>, StorageError> {
        Ok(self.clients.read().await.get(&id).cloned())
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Client>, StorageError> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>, StorageError> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .find(|c| c.client_id == client_id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let mut clients = self.clients.write().await;
        if clients.shift_remove(&id).is_none() {
            return Err(StorageError::not_found("client", id));
        }
        Ok(())
    }

    async fn delete_by_organization(&self, organization_id: Uuid) -> Result<usize, StorageError> {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, c| c.organization_id != organization_id);
        Ok(before - clients.len())
    }
}
