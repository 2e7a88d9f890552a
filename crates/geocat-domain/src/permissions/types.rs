//! Permission report types.

use geocat_storage::{Group, GroupId, MetadataId, Operation, OperationId, Profile, UserId};
use serde::Serialize;

/// Grant flag of one catalog operation for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationGrant {
    pub operation_id: OperationId,
    pub granted: bool,
}

/// A group annotated relative to the requester and the target record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPermissions {
    pub group: Group,
    /// The requester currently acts as a member of this group.
    pub is_user_group: bool,
    /// Profiles the requester holds in this group.
    pub user_profiles: Vec<Profile>,
    /// One entry per catalog operation, in catalog order.
    pub operation_grants: Vec<OperationGrant>,
}

impl GroupPermissions {
    pub fn is_granted(&self, operation_id: OperationId) -> bool {
        self.operation_grants
            .iter()
            .any(|g| g.operation_id == operation_id && g.granted)
    }
}

/// Everything an administrator needs to edit the privileges of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionReport {
    pub metadata_id: MetadataId,
    pub is_owner: bool,
    pub owner_id: UserId,
    pub group_owner: Option<GroupId>,
    /// The full operation catalog.
    pub operations: Vec<Operation>,
    pub groups: Vec<GroupPermissions>,
}

impl PermissionReport {
    pub fn group(&self, group_id: GroupId) -> Option<&GroupPermissions> {
        self.groups.iter().find(|g| g.group.id == group_id)
    }
}
