//! Dynamic GraphQL layer for the tablegate gateway.
//!
//! The schema is a derived artifact: it is rebuilt in full from the current
//! set of GraphQL-typed API definitions (never patched incrementally) and
//! published atomically, so readers always execute against a complete,
//! internally consistent schema.

pub mod context;
pub mod error;
pub mod handler;
pub mod schema;

pub use context::GatewayContext;
pub use error::GraphQLError;
pub use handler::{GraphQLState, graphql_handler};
pub use schema::{ApiSchemaBuilder, SharedSchema};
