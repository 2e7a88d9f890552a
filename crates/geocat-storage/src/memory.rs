//! In-memory storage implementation.
//!
//! Every table is a `DashMap` keyed by the row's primary key, so keyed
//! lookups and writes are O(1). Grants are bucketed per metadata record
//! in a `HashSet`, which makes re-writing an existing grant idempotent.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};
use crate::model::{
    Group, GroupId, Metadata, MetadataId, Operation, OperationAllowed, OperationId, User,
    UserGroup, UserId,
};
use crate::query::{OperationAllowedSpec, Sort, UserGroupSpec};
use crate::traits::{
    validate_group, validate_metadata, validate_operation, validate_user, CatalogStore,
};

/// In-memory implementation of CatalogStore.
///
/// # Performance Characteristics
///
/// - **Keyed get / save**: O(1) average (DashMap)
/// - **Email lookup**: O(U) over all users
/// - **Spec queries**: O(N) scan of the table, then a sort for stable output
/// - **Grant queries pinned to one record**: scan of that record's bucket only
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    users: DashMap<UserId, User>,
    groups: DashMap<GroupId, Group>,
    user_groups: DashMap<(UserId, GroupId), UserGroup>,
    metadata: DashMap<MetadataId, Metadata>,
    operations: DashMap<OperationId, Operation>,
    /// Grants bucketed by metadata record.
    grants: DashMap<MetadataId, HashSet<OperationAllowed>>,
}

impl MemoryCatalogStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn require_user(&self, id: UserId) -> StorageResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::InvalidInput {
                message: format!("unknown user {id}"),
            })
        }
    }

    fn require_group(&self, id: GroupId) -> StorageResult<()> {
        if self.groups.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::InvalidInput {
                message: format!("unknown group {id}"),
            })
        }
    }
}

/// Clones every value of `map` and returns them in key order.
fn sorted_values<K, V, F>(map: &DashMap<K, V>, key: F) -> Vec<V>
where
    K: Eq + std::hash::Hash,
    V: Clone,
    F: Fn(&V) -> i32,
{
    let mut values: Vec<V> = map.iter().map(|entry| entry.value().clone()).collect();
    values.sort_by_key(|v| key(v));
    values
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get_user(&self, id: UserId) -> StorageResult<User> {
        self.users
            .get(&id)
            .map(|u| u.value().clone())
            .ok_or(StorageError::UserNotFound { user_id: id })
    }

    #[instrument(skip(self))]
    async fn find_users_by_email(&self, email: &str) -> StorageResult<Vec<User>> {
        let mut found: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.has_email(email))
            .map(|u| u.value().clone())
            .collect();
        found.sort_by_key(|u| u.id);
        Ok(found)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        Ok(sorted_values(&self.users, |u| u.id.0))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save_user(&self, user: User) -> StorageResult<User> {
        validate_user(&user)?;

        let taken = self
            .users
            .iter()
            .any(|other| other.id != user.id && other.username == user.username);
        if taken {
            return Err(StorageError::Duplicate {
                entity: "username",
                key: user.username,
            });
        }

        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_group(&self, id: GroupId) -> StorageResult<Group> {
        self.groups
            .get(&id)
            .map(|g| g.value().clone())
            .ok_or(StorageError::GroupNotFound { group_id: id })
    }

    async fn list_groups(&self) -> StorageResult<Vec<Group>> {
        Ok(sorted_values(&self.groups, |g| g.id.0))
    }

    async fn save_group(&self, group: Group) -> StorageResult<Group> {
        validate_group(&group)?;
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    #[instrument(skip(self))]
    async fn find_user_groups(
        &self,
        spec: &UserGroupSpec,
        sort: Option<&Sort>,
    ) -> StorageResult<Vec<UserGroup>> {
        let mut rows: Vec<UserGroup> = self
            .user_groups
            .iter()
            .filter(|row| spec.matches(row.value()))
            .map(|row| row.value().clone())
            .collect();
        rows.sort_by_key(|row| row.key());
        if let Some(sort) = sort {
            sort.apply(&mut rows);
        }
        debug!(matched = rows.len(), "user group query");
        Ok(rows)
    }

    async fn save_user_group(&self, user_group: UserGroup) -> StorageResult<UserGroup> {
        self.require_user(user_group.user_id)?;
        self.require_group(user_group.group_id)?;
        self.user_groups
            .insert(user_group.key(), user_group.clone());
        Ok(user_group)
    }

    async fn delete_user_group(&self, user_id: UserId, group_id: GroupId) -> StorageResult<bool> {
        Ok(self.user_groups.remove(&(user_id, group_id)).is_some())
    }

    async fn get_metadata(&self, id: MetadataId) -> StorageResult<Metadata> {
        self.metadata
            .get(&id)
            .map(|m| m.value().clone())
            .ok_or(StorageError::MetadataNotFound { metadata_id: id })
    }

    async fn find_metadata_by_uuid(&self, uuid: &str) -> StorageResult<Option<Metadata>> {
        Ok(self
            .metadata
            .iter()
            .find(|m| m.uuid == uuid)
            .map(|m| m.value().clone()))
    }

    async fn list_metadata(&self) -> StorageResult<Vec<Metadata>> {
        Ok(sorted_values(&self.metadata, |m| m.id.0))
    }

    #[instrument(skip(self, metadata), fields(metadata_id = %metadata.id))]
    async fn save_metadata(&self, metadata: Metadata) -> StorageResult<Metadata> {
        validate_metadata(&metadata)?;
        self.require_user(metadata.source_info.owner)?;
        if let Some(group_owner) = metadata.source_info.group_owner {
            self.require_group(group_owner)?;
        }

        let uuid_taken = self
            .metadata
            .iter()
            .any(|other| other.id != metadata.id && other.uuid == metadata.uuid);
        if uuid_taken {
            return Err(StorageError::Duplicate {
                entity: "metadata uuid",
                key: metadata.uuid,
            });
        }

        self.metadata.insert(metadata.id, metadata.clone());
        Ok(metadata)
    }

    async fn get_operation(&self, id: OperationId) -> StorageResult<Operation> {
        self.operations
            .get(&id)
            .map(|op| op.value().clone())
            .ok_or(StorageError::OperationNotFound { operation_id: id })
    }

    async fn list_operations(&self) -> StorageResult<Vec<Operation>> {
        Ok(sorted_values(&self.operations, |op| op.id.0))
    }

    async fn save_operation(&self, operation: Operation) -> StorageResult<Operation> {
        validate_operation(&operation)?;
        self.operations.insert(operation.id, operation.clone());
        Ok(operation)
    }

    #[instrument(skip(self))]
    async fn find_operations_allowed(
        &self,
        spec: &OperationAllowedSpec,
    ) -> StorageResult<Vec<OperationAllowed>> {
        let mut rows: Vec<OperationAllowed> = match spec.pinned_metadata_id() {
            Some(metadata_id) => self
                .grants
                .get(&metadata_id)
                .map(|bucket| {
                    bucket
                        .iter()
                        .filter(|grant| spec.matches(grant))
                        .copied()
                        .collect()
                })
                .unwrap_or_default(),
            None => self
                .grants
                .iter()
                .flat_map(|bucket| {
                    bucket
                        .value()
                        .iter()
                        .filter(|grant| spec.matches(grant))
                        .copied()
                        .collect::<Vec<_>>()
                })
                .collect(),
        };
        rows.sort();
        Ok(rows)
    }

    async fn save_operation_allowed(&self, grant: OperationAllowed) -> StorageResult<()> {
        if !self.metadata.contains_key(&grant.metadata_id) {
            return Err(StorageError::InvalidInput {
                message: format!("unknown metadata {}", grant.metadata_id),
            });
        }
        self.require_group(grant.group_id)?;
        if !self.operations.contains_key(&grant.operation_id) {
            return Err(StorageError::InvalidInput {
                message: format!("unknown operation {}", grant.operation_id),
            });
        }

        self.grants
            .entry(grant.metadata_id)
            .or_default()
            .insert(grant);
        Ok(())
    }

    async fn delete_operation_allowed(&self, grant: OperationAllowed) -> StorageResult<bool> {
        Ok(self
            .grants
            .get_mut(&grant.metadata_id)
            .map(|mut bucket| bucket.remove(&grant))
            .unwrap_or(false))
    }
}
