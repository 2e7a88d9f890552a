//! CatalogStore trait definition.

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::model::{
    Group, GroupId, Metadata, MetadataId, Operation, OperationAllowed, OperationId, User, UserGroup,
    UserId,
};
use crate::query::{OperationAllowedSpec, Sort, UserGroupSpec};

/// Abstract storage interface for catalog and access-control data.
///
/// Implementations must be thread-safe (Send + Sync). Keyed lookups on a
/// missing key return the matching `*NotFound` error; list and find queries
/// with no match return an empty vector. Lists come back in ascending
/// identifier order unless a [`Sort`] says otherwise.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    // User operations

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> StorageResult<User>;

    /// Finds every user whose email set contains `email`.
    async fn find_users_by_email(&self, email: &str) -> StorageResult<Vec<User>>;

    /// Lists all users.
    async fn list_users(&self) -> StorageResult<Vec<User>>;

    /// Inserts or replaces a user.
    async fn save_user(&self, user: User) -> StorageResult<User>;

    // Group operations

    /// Gets a group by ID.
    async fn get_group(&self, id: GroupId) -> StorageResult<Group>;

    /// Lists all groups.
    async fn list_groups(&self) -> StorageResult<Vec<Group>>;

    /// Inserts or replaces a group.
    async fn save_group(&self, group: Group) -> StorageResult<Group>;

    // Membership operations

    /// Finds memberships matching `spec`, ordered by `sort` when given.
    async fn find_user_groups(
        &self,
        spec: &UserGroupSpec,
        sort: Option<&Sort>,
    ) -> StorageResult<Vec<UserGroup>>;

    /// Inserts a membership, or replaces the profile of an existing one.
    async fn save_user_group(&self, user_group: UserGroup) -> StorageResult<UserGroup>;

    /// Removes a membership. Returns whether a row was removed.
    async fn delete_user_group(&self, user_id: UserId, group_id: GroupId) -> StorageResult<bool>;

    // Metadata operations

    /// Gets a metadata record by ID.
    async fn get_metadata(&self, id: MetadataId) -> StorageResult<Metadata>;

    /// Finds a metadata record by UUID.
    async fn find_metadata_by_uuid(&self, uuid: &str) -> StorageResult<Option<Metadata>>;

    /// Lists all metadata records.
    async fn list_metadata(&self) -> StorageResult<Vec<Metadata>>;

    /// Inserts or replaces a metadata record.
    async fn save_metadata(&self, metadata: Metadata) -> StorageResult<Metadata>;

    // Operation catalog

    /// Gets an operation by ID.
    async fn get_operation(&self, id: OperationId) -> StorageResult<Operation>;

    /// Lists the full operation catalog.
    async fn list_operations(&self) -> StorageResult<Vec<Operation>>;

    /// Inserts or replaces an operation.
    async fn save_operation(&self, operation: Operation) -> StorageResult<Operation>;

    // Grants

    /// Finds grants matching `spec`.
    async fn find_operations_allowed(
        &self,
        spec: &OperationAllowedSpec,
    ) -> StorageResult<Vec<OperationAllowed>>;

    /// Writes a grant. Writing an existing grant is a no-op.
    async fn save_operation_allowed(&self, grant: OperationAllowed) -> StorageResult<()>;

    /// Removes a grant. Returns whether a row was removed.
    async fn delete_operation_allowed(&self, grant: OperationAllowed) -> StorageResult<bool>;
}

/// Maximum length for user, group and operation names.
pub const MAX_NAME_LENGTH: usize = 256;

fn validate_name(entity: &str, name: &str) -> StorageResult<()> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: format!("{entity} name cannot be empty"),
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(StorageError::InvalidInput {
            message: format!("{entity} name exceeds {MAX_NAME_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Validates a user before it is written.
pub fn validate_user(user: &User) -> StorageResult<()> {
    validate_name("user", &user.username)?;
    for email in &user.emails {
        if !email.contains('@') {
            return Err(StorageError::InvalidInput {
                message: format!("invalid email address for user {}: {email}", user.id),
            });
        }
    }
    Ok(())
}

/// Validates a group before it is written.
pub fn validate_group(group: &Group) -> StorageResult<()> {
    validate_name("group", &group.name)
}

/// Validates an operation before it is written.
pub fn validate_operation(operation: &Operation) -> StorageResult<()> {
    validate_name("operation", &operation.name)
}

/// Validates a metadata record before it is written.
pub fn validate_metadata(metadata: &Metadata) -> StorageResult<()> {
    if metadata.uuid.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: format!("metadata {} has an empty uuid", metadata.id),
        });
    }
    Ok(())
}
