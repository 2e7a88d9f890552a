//! geocat-domain: User lookup and metadata permission resolution
//!
//! This crate contains the catalog's access-control logic including:
//! - Resolution of users by id, email, metadata ownership and membership
//! - The requester's effective group set
//! - The per-record privilege matrix (groups x operations)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                geocat-domain                │
//! ├─────────────────────────────────────────────┤
//! │  users.rs     - User lookup                 │
//! │  access.rs    - Sessions & group membership │
//! │  permissions/ - Permission resolver         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod error;
pub mod permissions;
pub mod users;

// Re-export commonly used types at the crate root
pub use access::{AccessManager, AccessProvider, IntranetNetwork, Requester, UserSession};
pub use error::{DomainError, DomainResult};
pub use permissions::{GroupPermissions, OperationGrant, PermissionReport, PermissionResolver};
pub use users::UserLookup;
