//! Metadata permission resolution.
//!
//! For one metadata record, reports ownership, the operation catalog and,
//! for every group, the requester's membership and the operations granted
//! to that group on the record.

mod resolver;
mod types;


pub use resolver::PermissionResolver;
pub use types::{GroupPermissions, OperationGrant, PermissionReport};
