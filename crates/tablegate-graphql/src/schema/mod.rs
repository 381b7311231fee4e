//! Dynamic schema construction and publication.

pub mod builder;
pub mod shared;

pub use builder::ApiSchemaBuilder;
pub use shared::SharedSchema;
