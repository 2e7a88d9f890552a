//! YAML catalog seeds.
//!
//! ```yaml
//! users:
//!   - { id: 1, username: admin, profile: Administrator, emails: [admin@example.com] }
//! groups:
//!   - { id: 2, name: sample }
//! memberships:
//!   - { user_id: 1, group_id: 2, profile: Editor }
//! metadata:
//!   - id: 10
//!     uuid: da165110-88fd-11da-a88f-000d939bc5d8
//!     source_info: { owner: 1, group_owner: 2 }
//! grants:
//!   - { metadata_id: 10, group_id: 1, operation_id: 0 }
//! ```
//!
//! Omitted `operations` fall back to the built-in reserved catalog. The
//! reserved groups are always present.

use std::path::Path;

use geocat_storage::{
    CatalogStore, Group, Metadata, Operation, OperationAllowed, ReservedGroup,
    ReservedOperation, User, UserGroup,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::FixtureError;

/// A complete catalog seed.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CatalogFixture {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub memberships: Vec<UserGroup>,
    pub metadata: Vec<Metadata>,
    /// `None` means the reserved operation catalog.
    pub operations: Option<Vec<Operation>>,
    pub grants: Vec<OperationAllowed>,
}

impl CatalogFixture {
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Saves every row, parents before the rows that reference them.
    pub async fn load_into<S: CatalogStore + ?Sized>(&self, store: &S) -> Result<(), FixtureError> {
        let operations = self
            .operations
            .clone()
            .unwrap_or_else(ReservedOperation::catalog);
        for operation in operations {
            store.save_operation(operation).await?;
        }

        for reserved in [ReservedGroup::Intranet, ReservedGroup::All] {
            if !self.groups.iter().any(|g| g.id == reserved.id()) {
                store.save_group(reserved.group()).await?;
            }
        }
        for group in &self.groups {
            store.save_group(group.clone()).await?;
        }
        for user in &self.users {
            store.save_user(user.clone()).await?;
        }
        for membership in &self.memberships {
            store.save_user_group(membership.clone()).await?;
        }
        for metadata in &self.metadata {
            store.save_metadata(metadata.clone()).await?;
        }
        for grant in &self.grants {
            store.save_operation_allowed(*grant).await?;
        }

        info!(
            users = self.users.len(),
            groups = self.groups.len(),
            metadata = self.metadata.len(),
            grants = self.grants.len(),
            "catalog fixture loaded"
        );
        Ok(())
    }
}
