//! Store traits for gateway metadata.
//!
//! All implementations must be thread-safe (`Send + Sync`); the gateway
//! holds them as `Arc<dyn ...>` and calls them concurrently from request
//! handlers.

use async_trait::async_trait;
use uuid::Uuid;

use tablegate_core::{ApiDefinition, ApiType, Client, DbConnectionDescriptor, Organization};

use crate::error::StorageError;

/// CRUD over external-database connection descriptors.
///
/// Deleting a descriptor cascades to the API definitions it owns.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn create(
        &self,
        descriptor: DbConnectionDescriptor,
    ) -> Result<DbConnectionDescriptor, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<DbConnectionDescriptor>, StorageError>;

    async fn list(&self) -> Result<Vec<DbConnectionDescriptor>, StorageError>;

    /// Replaces an existing descriptor.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no descriptor has this id.
    async fn update(
        &self,
        descriptor: DbConnectionDescriptor,
    ) -> Result<DbConnectionDescriptor, StorageError>;

    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}

/// CRUD over API definitions plus the lookups the serving paths need.
#[async_trait]
pub trait ApiDefinitionStore: Send + Sync {
    async fn create(&self, definition: ApiDefinition) -> Result<ApiDefinition, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<ApiDefinition>, StorageError>;

    async fn list(&self) -> Result<Vec<ApiDefinition>, StorageError>;

    async fn list_by_type(&self, api_type: ApiType) -> Result<Vec<ApiDefinition>, StorageError>;

    /// First definition matching (table name, API type); the table name
    /// comparison is case-insensitive and insertion order decides ties.
    async fn find_by_table(
        &self,
        table_name: &str,
        api_type: ApiType,
    ) -> Result<Option<ApiDefinition>, StorageError>;

    async fn update(&self, definition: ApiDefinition) -> Result<ApiDefinition, StorageError>;

    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;

    /// Removes every definition owned by a connection, returning the count.
    async fn delete_by_connection(&self, connection_id: Uuid) -> Result<usize, StorageError>;
}

/// CRUD over organizations.
///
/// Deleting an organization cascades to its clients.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn create(&self, organization: Organization) -> Result<Organization, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Organization>, StorageError>;

    async fn list(&self) -> Result<Vec<Organization>, StorageError>;

    async fn update(&self, organization: Organization) -> Result<Organization, StorageError>;

    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}

/// CRUD over API clients.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create(&self, client: Client) -> Result<Client, StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Client>, StorageError>;

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Client>, StorageError>;

    /// Looks a client up by its generated `client_id` credential.
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>, StorageError>;

    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;

    /// Removes every client owned by an organization, returning the count.
    async fn delete_by_organization(&self, organization_id: Uuid) -> Result<usize, StorageError>;
}
