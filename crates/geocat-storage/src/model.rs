//! Catalog entity model.
//!
//! These are the rows the store hands out: users, groups, memberships,
//! metadata records, the operation catalog and operation grants.

use std::collections::BTreeSet;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i32>().map($name)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                $name(value)
            }
        }
    };
}

id_type!(
    /// User identifier.
    UserId
);
id_type!(
    /// Group identifier.
    GroupId
);
id_type!(
    /// Metadata record identifier.
    MetadataId
);
id_type!(
    /// Operation identifier.
    OperationId
);

/// Role a user holds, either globally or within a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Profile {
    Administrator,
    UserAdmin,
    Reviewer,
    Editor,
    RegisteredUser,
    Guest,
    Monitor,
}

/// Error type for parsing a [`Profile`] from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProfileError(pub String);

impl fmt::Display for ParseProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid profile: {}", self.0)
    }
}

impl std::error::Error for ParseProfileError {}

impl FromStr for Profile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Administrator" => Ok(Profile::Administrator),
            "UserAdmin" => Ok(Profile::UserAdmin),
            "Reviewer" => Ok(Profile::Reviewer),
            "Editor" => Ok(Profile::Editor),
            "RegisteredUser" => Ok(Profile::RegisteredUser),
            "Guest" => Ok(Profile::Guest),
            "Monitor" => Ok(Profile::Monitor),
            _ => Err(ParseProfileError(s.to_string())),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Administrator => "Administrator",
            Profile::UserAdmin => "UserAdmin",
            Profile::Reviewer => "Reviewer",
            Profile::Editor => "Editor",
            Profile::RegisteredUser => "RegisteredUser",
            Profile::Guest => "Guest",
            Profile::Monitor => "Monitor",
        }
    }

    /// Position on the editing ladder, lower is more privileged.
    /// `Monitor` sits beside the ladder.
    fn ladder_rank(&self) -> Option<u8> {
        match self {
            Profile::Administrator => Some(0),
            Profile::UserAdmin => Some(1),
            Profile::Reviewer => Some(2),
            Profile::Editor => Some(3),
            Profile::RegisteredUser => Some(4),
            Profile::Guest => Some(5),
            Profile::Monitor => None,
        }
    }

    /// Check if this profile has at least the rights of another profile
    pub fn includes(&self, other: &Profile) -> bool {
        if self == other || *self == Profile::Administrator {
            return true;
        }
        match (self.ladder_rank(), other.ladder_rank()) {
            (Some(mine), Some(theirs)) => mine <= theirs,
            // Monitor can see what a registered user sees, nothing more.
            (None, Some(theirs)) => theirs >= 4,
            (_, None) => false,
        }
    }
}

/// User record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    /// Order is irrelevant; one user may have several addresses.
    #[serde(default)]
    pub emails: BTreeSet<String>,
    pub profile: Profile,
}

impl User {
    pub fn has_email(&self, email: &str) -> bool {
        self.emails.contains(email)
    }
}

/// Group record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Groups every installation ships with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservedGroup {
    Intranet,
    All,
}

impl ReservedGroup {
    pub fn id(&self) -> GroupId {
        match self {
            ReservedGroup::Intranet => GroupId(0),
            ReservedGroup::All => GroupId(1),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReservedGroup::Intranet => "intranet",
            ReservedGroup::All => "all",
        }
    }

    pub fn group(&self) -> Group {
        Group {
            id: self.id(),
            name: self.name().to_string(),
            description: None,
        }
    }
}

/// Membership of a user in a group, with the profile held there.
///
/// Keyed by `(user_id, group_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    pub user_id: UserId,
    pub group_id: GroupId,
    pub profile: Profile,
}

impl UserGroup {
    pub fn key(&self) -> (UserId, GroupId) {
        (self.user_id, self.group_id)
    }
}

/// Ownership information of a metadata record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSourceInfo {
    pub owner: UserId,
    #[serde(default)]
    pub group_owner: Option<GroupId>,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// Metadata record (only the fields access control needs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: MetadataId,
    pub uuid: String,
    pub source_info: MetadataSourceInfo,
}

/// Entry of the operation catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
    #[serde(default)]
    pub reserved: bool,
}

/// System-defined operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReservedOperation {
    View,
    Download,
    Editing,
    Notify,
    Dynamic,
    Featured,
}

impl ReservedOperation {
    pub const ALL: [ReservedOperation; 6] = [
        ReservedOperation::View,
        ReservedOperation::Download,
        ReservedOperation::Editing,
        ReservedOperation::Notify,
        ReservedOperation::Dynamic,
        ReservedOperation::Featured,
    ];

    pub fn id(&self) -> OperationId {
        match self {
            ReservedOperation::View => OperationId(0),
            ReservedOperation::Download => OperationId(1),
            ReservedOperation::Editing => OperationId(2),
            ReservedOperation::Notify => OperationId(3),
            ReservedOperation::Dynamic => OperationId(5),
            ReservedOperation::Featured => OperationId(6),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReservedOperation::View => "view",
            ReservedOperation::Download => "download",
            ReservedOperation::Editing => "editing",
            ReservedOperation::Notify => "notify",
            ReservedOperation::Dynamic => "dynamic",
            ReservedOperation::Featured => "featured",
        }
    }

    pub fn operation(&self) -> Operation {
        Operation {
            id: self.id(),
            name: self.name().to_string(),
            reserved: true,
        }
    }

    /// The built-in operation catalog, in identifier order.
    pub fn catalog() -> Vec<Operation> {
        Self::ALL.iter().map(|op| op.operation()).collect()
    }
}

/// Grant of one operation on one metadata record to one group.
///
/// Existence of the row is the grant; there is no payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationAllowed {
    pub metadata_id: MetadataId,
    pub group_id: GroupId,
    pub operation_id: OperationId,
}

impl OperationAllowed {
    pub fn new(metadata_id: MetadataId, group_id: GroupId, operation_id: OperationId) -> Self {
        Self {
            metadata_id,
            group_id,
            operation_id,
        }
    }
}
