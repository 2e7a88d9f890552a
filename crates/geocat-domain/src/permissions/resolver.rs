//! Resolution of a record's privilege matrix.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use geocat_storage::{
    CatalogStore, Group, GroupId, MetadataId, Operation, OperationAllowedSpec, OperationId,
    UserGroupSpec, UserId,
};
use tracing::{debug, instrument};

use super::types::{GroupPermissions, OperationGrant, PermissionReport};
use crate::access::{AccessProvider, Requester};
use crate::error::{DomainError, DomainResult};

/// Builds [`PermissionReport`]s.
///
/// The resolver is read-only and holds no per-request state, so one
/// instance can serve concurrent requests.
pub struct PermissionResolver<S, A> {
    store: Arc<S>,
    access: Arc<A>,
}

impl<S, A> PermissionResolver<S, A>
where
    S: CatalogStore,
    A: AccessProvider,
{
    pub fn new(store: Arc<S>, access: Arc<A>) -> Self {
        Self { store, access }
    }

    /// Resolves the privilege matrix of `metadata_id` as seen by `requester`.
    ///
    /// Fails with [`DomainError::MetadataNotFound`] when the record does not
    /// exist; no partial report is produced.
    #[instrument(skip(self, requester), fields(requester = ?requester.user_id()))]
    pub async fn resolve(
        &self,
        metadata_id: MetadataId,
        requester: &Requester,
    ) -> DomainResult<PermissionReport> {
        let metadata = match self.store.get_metadata(metadata_id).await {
            Ok(metadata) => metadata,
            Err(err) if err.is_not_found() => {
                debug!(%metadata_id, "metadata not found");
                return Err(DomainError::metadata_not_found(metadata_id));
            }
            Err(err) => return Err(err.into()),
        };

        let requester_id = requester.user_id();
        let is_owner = requester_id == Some(metadata.source_info.owner);

        let operations = self.store.list_operations().await?;
        let user_groups = self
            .access
            .user_groups(&requester.session, requester.ip, false)
            .await?;
        let groups = self.store.list_groups().await?;

        let groups = try_join_all(groups.into_iter().map(|group| {
            self.group_permissions(metadata_id, group, requester_id, &user_groups, &operations)
        }))
        .await?;

        debug!(
            %metadata_id,
            is_owner,
            operations = operations.len(),
            groups = groups.len(),
            "resolved permissions"
        );

        Ok(PermissionReport {
            metadata_id,
            is_owner,
            owner_id: metadata.source_info.owner,
            group_owner: metadata.source_info.group_owner,
            operations,
            groups,
        })
    }

    async fn group_permissions(
        &self,
        metadata_id: MetadataId,
        group: Group,
        requester_id: Option<UserId>,
        user_groups: &HashSet<GroupId>,
        operations: &[Operation],
    ) -> DomainResult<GroupPermissions> {
        let is_user_group = user_groups.contains(&group.id);

        let user_profiles = match requester_id {
            Some(user_id) => {
                let spec = UserGroupSpec::has_user_id(user_id)
                    .and(UserGroupSpec::has_group_id(group.id));
                self.store
                    .find_user_groups(&spec, None)
                    .await?
                    .into_iter()
                    .map(|row| row.profile)
                    .collect()
            }
            None => Vec::new(),
        };

        let spec = OperationAllowedSpec::has_metadata_id(metadata_id)
            .and(OperationAllowedSpec::has_group_id(group.id));
        let granted: HashSet<OperationId> = self
            .store
            .find_operations_allowed(&spec)
            .await?
            .into_iter()
            .map(|grant| grant.operation_id)
            .collect();

        let operation_grants = operations
            .iter()
            .map(|op| OperationGrant {
                operation_id: op.id,
                granted: granted.contains(&op.id),
            })
            .collect();

        Ok(GroupPermissions {
            group,
            is_user_group,
            user_profiles,
            operation_grants,
        })
    }
}
