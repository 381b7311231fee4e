//! Atomic publication of the derived schema artifact.
//!
//! Readers execute against the currently published schema through a
//! lock-free pointer load; `refresh()` builds a complete replacement off to
//! the side and swaps it in only when construction succeeded. A failed
//! rebuild leaves the previous schema active, so the gateway never serves a
//! partial or missing schema.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_graphql::dynamic::Schema;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::context::GatewayContext;
use crate::error::GraphQLError;
use crate::schema::builder::ApiSchemaBuilder;

/// Thread-safe holder of the published GraphQL schema.
pub struct SharedSchema {
    builder: ApiSchemaBuilder,
    current: ArcSwap<Schema>,
    /// Serializes rebuilds; never held while readers load the schema.
    rebuild_lock: Mutex<()>,
}

impl SharedSchema {
    /// Builds the initial schema and publishes it.
    ///
    /// If the very first build fails there is no previous artifact to keep
    /// serving, so the placeholder schema is published and the error is
    /// logged; the next successful `refresh()` replaces it.
    pub async fn initialize(context: Arc<GatewayContext>) -> Result<Self, GraphQLError> {
        let builder = ApiSchemaBuilder::new(context);
        let schema = match builder.build().await {
            Ok(schema) => schema,
            Err(e) => {
                error!(error = %e, "Initial schema build failed, starting with placeholder");
                builder.placeholder()?
            }
        };

        info!("GraphQL schema published");
        Ok(Self {
            builder,
            current: ArcSwap::from_pointee(schema),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// The currently published schema.
    pub fn load(&self) -> Arc<Schema> {
        self.current.load_full()
    }

    /// SDL of the currently published schema.
    pub fn sdl(&self) -> String {
        self.current.load().sdl()
    }

    /// Rebuilds the schema from the current definition set and publishes
    /// the replacement atomically.
    ///
    /// # Errors
    ///
    /// Returns the build error; the previously published schema stays
    /// active in that case.
    pub async fn refresh(&self) -> Result<(), GraphQLError> {
        let _guard = self.rebuild_lock.lock().await;

        let schema = self.builder.build().await?;
        self.current.store(Arc::new(schema));
        info!("GraphQL schema rebuilt");
        Ok(())
    }
}

impl std::fmt::Debug for SharedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSchema").finish_non_exhaustive()
    }
}
