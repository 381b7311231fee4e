//! Core domain model for the tablegate data-API gateway.
//!
//! This crate defines the entities the gateway operates on: external
//! database connection descriptors, declarative API definitions, and the
//! organization/client records used for token issuance. It carries no I/O;
//! storage and execution live in the sibling crates.

pub mod error;
pub mod model;

pub use error::{CoreError, Result};
pub use model::{
    ApiDefinition, ApiType, Client, DbConnectionDescriptor, DriverKind, Operation, OperationSet,
    Organization, OrganizationStatus,
};
