//! geocat-storage: Catalog storage abstraction layer
//!
//! This crate provides the storage abstraction for the catalog, including:
//! - The entity model (users, groups, memberships, metadata, operations, grants)
//! - Composable query specs and caller-supplied sort orders
//! - CatalogStore trait for storage operations
//! - In-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               geocat-storage                │
//! ├─────────────────────────────────────────────┤
//! │  model.rs  - Entity rows and identifiers    │
//! │  query.rs  - Specs and sort orders          │
//! │  traits.rs - CatalogStore trait definition  │
//! │  memory.rs - In-memory implementation       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod model;
pub mod query;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryCatalogStore;
pub use model::{
    Group, GroupId, Metadata, MetadataId, MetadataSourceInfo, Operation, OperationAllowed,
    OperationId, Profile, ReservedGroup, ReservedOperation, User, UserGroup, UserId,
};
pub use query::{
    Direction, OperationAllowedSpec, Order, Sort, SortField, SortValue, Sortable, UserGroupSpec,
};
pub use traits::CatalogStore;
