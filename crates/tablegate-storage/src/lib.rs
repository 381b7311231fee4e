//! Metadata store abstraction for the tablegate gateway.
//!
//! The gateway core treats its metadata persistence as a simple CRUD
//! collaborator behind the traits in [`traits`]. The bundled
//! [`MemoryMetadataStore`] keeps everything in process memory with
//! insertion-ordered maps, which makes first-match lookups deterministic.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryMetadataStore;
pub use traits::{ApiDefinitionStore, ClientStore, ConnectionStore, OrganizationStore};
