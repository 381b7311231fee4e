//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;

use tablegate_auth::{ClientDirectory, JwtService, TokenState};
use tablegate_config::{AppConfig, SecretCipher};
use tablegate_db::{ConnectionHub, ConnectionRegistry, QueryExecutor, SchemaIntrospector};
use tablegate_graphql::{GatewayContext, GraphQLState, SharedSchema};
use tablegate_storage::{
    ApiDefinitionStore, ClientStore, ConnectionStore, MemoryMetadataStore, OrganizationStore,
};

/// Everything the request handlers need, cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub connections: Arc<dyn ConnectionStore>,
    pub definitions: Arc<dyn ApiDefinitionStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub hub: Arc<ConnectionHub>,
    pub executor: QueryExecutor,
    pub introspector: SchemaIntrospector,
    pub schema: Arc<SharedSchema>,
    pub gateway_context: Arc<GatewayContext>,
    pub directory: Arc<ClientDirectory>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    /// Wires the gateway together over an in-memory metadata store and
    /// builds the initial GraphQL schema.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let cipher = SecretCipher::new(&config.security.cipher_secret);
        let store = Arc::new(MemoryMetadataStore::new());

        let connections: Arc<dyn ConnectionStore> = store.clone();
        let definitions: Arc<dyn ApiDefinitionStore> = store.clone();
        let organizations: Arc<dyn OrganizationStore> = store.clone();
        let clients: Arc<dyn ClientStore> = store.clone();

        let hub = Arc::new(ConnectionHub::new(cipher.clone()));
        let registry = Arc::new(ConnectionRegistry::new(
            connections.clone(),
            cipher.clone(),
            hub.clone(),
        ));
        let introspector = SchemaIntrospector::new(cipher.clone());

        let gateway_context = Arc::new(GatewayContext::new(
            definitions.clone(),
            connections.clone(),
            hub.clone(),
            introspector.clone(),
        ));
        let schema = Arc::new(SharedSchema::initialize(gateway_context.clone()).await?);

        let directory = Arc::new(ClientDirectory::new(clients, cipher));
        let jwt = Arc::new(JwtService::new(
            &config.security.jwt_secret,
            config.base_url(),
            config.security.token_ttl_secs,
            config.security.default_scope.clone(),
        ));

        Ok(Self {
            config,
            connections,
            definitions,
            organizations,
            registry,
            hub,
            executor: QueryExecutor::new(),
            introspector,
            schema,
            gateway_context,
            directory,
            jwt,
        })
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(state: &AppState) -> Self {
        TokenState {
            directory: state.directory.clone(),
            jwt: state.jwt.clone(),
        }
    }
}

impl FromRef<AppState> for GraphQLState {
    fn from_ref(state: &AppState) -> Self {
        GraphQLState {
            schema: state.schema.clone(),
            context: state.gateway_context.clone(),
        }
    }
}
