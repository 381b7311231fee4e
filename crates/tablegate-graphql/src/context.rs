//! Shared dependencies the schema builder and field resolvers draw on.

use std::sync::Arc;

use tablegate_db::{ConnectionHub, QueryExecutor, SchemaIntrospector};
use tablegate_storage::{ApiDefinitionStore, ConnectionStore};

/// Dependencies injected into every GraphQL request.
///
/// The builder uses the stores and introspector at build time; field
/// resolvers re-resolve definitions and connections through the same
/// context at query time, so credential changes take effect without a
/// schema rebuild.
pub struct GatewayContext {
    pub definitions: Arc<dyn ApiDefinitionStore>,
    pub connections: Arc<dyn ConnectionStore>,
    pub hub: Arc<ConnectionHub>,
    pub executor: QueryExecutor,
    pub introspector: SchemaIntrospector,
}

impl GatewayContext {
    pub fn new(
        definitions: Arc<dyn ApiDefinitionStore>,
        connections: Arc<dyn ConnectionStore>,
        hub: Arc<ConnectionHub>,
        introspector: SchemaIntrospector,
    ) -> Self {
        Self {
            definitions,
            connections,
            hub,
            executor: QueryExecutor::new(),
            introspector,
        }
    }
}
