//! Requester identity and effective group membership.
//!
//! A request reaches the domain with three facts: who the requester is,
//! which groups they effectively belong to, and where they connect from.
//! [`AccessProvider`] turns the first and last into the second.

use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use geocat_storage::{CatalogStore, GroupId, Profile, ReservedGroup, UserGroupSpec, UserId};
use tracing::debug;

use crate::error::DomainResult;

/// Authenticated (or anonymous) session of the requester.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    /// `None` for anonymous sessions.
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    /// Global profile of the authenticated user.
    pub profile: Option<Profile>,
}

impl UserSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: UserId, username: impl Into<String>, profile: Profile) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.into()),
            profile: Some(profile),
        }
    }
}

/// The requester as seen by a single service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub session: UserSession,
    /// Client network origin.
    pub ip: IpAddr,
}

impl Requester {
    pub fn new(session: UserSession, ip: IpAddr) -> Self {
        Self { session, ip }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.session.user_id
    }
}

/// Source of a requester's effective group set.
#[async_trait]
pub trait AccessProvider: Send + Sync {
    /// Groups the requester acts as a member of.
    ///
    /// With `editing_only`, only groups where the requester may edit count.
    async fn user_groups(
        &self,
        session: &UserSession,
        ip: IpAddr,
        editing_only: bool,
    ) -> DomainResult<HashSet<GroupId>>;
}

/// Network (address plus mask) treated as the intranet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntranetNetwork {
    pub network: IpAddr,
    pub netmask: IpAddr,
}

impl IntranetNetwork {
    pub fn new(network: IpAddr, netmask: IpAddr) -> Self {
        Self { network, netmask }
    }

    /// True when `ip` falls inside the network. Mismatched address
    /// families never match.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, self.netmask, ip) {
            (IpAddr::V4(net), IpAddr::V4(mask), IpAddr::V4(addr)) => {
                let mask = u32::from(mask);
                u32::from(net) & mask == u32::from(addr) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(mask), IpAddr::V6(addr)) => {
                let mask = u128::from(mask);
                u128::from(net) & mask == u128::from(addr) & mask
            }
            _ => false,
        }
    }
}

/// Profiles that may edit inside a group.
fn editing_profiles() -> BTreeSet<Profile> {
    [
        Profile::Administrator,
        Profile::UserAdmin,
        Profile::Reviewer,
        Profile::Editor,
        Profile::RegisteredUser,
        Profile::Guest,
        Profile::Monitor,
    ]
    .into_iter()
    .filter(|p| p.includes(&Profile::Editor))
    .collect()
}

/// Store-backed [`AccessProvider`].
///
/// - the `all` group is always included (unless `editing_only`)
/// - the `intranet` group is included for clients inside the intranet network
/// - administrators are members of every group
/// - everyone else is a member of the groups they hold a membership row in
pub struct AccessManager<S> {
    store: Arc<S>,
    intranet: Option<IntranetNetwork>,
}

impl<S: CatalogStore> AccessManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            intranet: None,
        }
    }

    pub fn with_intranet(mut self, intranet: IntranetNetwork) -> Self {
        self.intranet = Some(intranet);
        self
    }

    pub fn is_intranet(&self, ip: IpAddr) -> bool {
        self.intranet.is_some_and(|net| net.contains(ip))
    }
}

#[async_trait]
impl<S: CatalogStore> AccessProvider for AccessManager<S> {
    async fn user_groups(
        &self,
        session: &UserSession,
        ip: IpAddr,
        editing_only: bool,
    ) -> DomainResult<HashSet<GroupId>> {
        let mut groups = HashSet::new();

        if !editing_only {
            groups.insert(ReservedGroup::All.id());
            if self.is_intranet(ip) {
                groups.insert(ReservedGroup::Intranet.id());
            }
        }

        let Some(user_id) = session.user_id else {
            return Ok(groups);
        };

        if session.profile == Some(Profile::Administrator) {
            groups.extend(self.store.list_groups().await?.into_iter().map(|g| g.id));
            return Ok(groups);
        }

        let mut spec = UserGroupSpec::has_user_id(user_id);
        if editing_only {
            spec = spec.and(UserGroupSpec::ProfileIn(editing_profiles()));
        }
        let memberships = self.store.find_user_groups(&spec, None).await?;
        groups.extend(memberships.into_iter().map(|m| m.group_id));

        debug!(%user_id, count = groups.len(), editing_only, "resolved user groups");
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::net::{Ipv4Addr, Ipv6Addr};

    use geocat_storage::{Group, MemoryCatalogStore, User, UserGroup};

    use super::*;

    fn localhost_net() -> IntranetNetwork {
        IntranetNetwork::new(
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(255, 0, 0, 0)),
        )
    }

    async fn store() -> Arc<MemoryCatalogStore> {
        let store = MemoryCatalogStore::new_shared();
        for (id, name) in [(0, "intranet"), (1, "all"), (2, "sample"), (3, "editors")] {
            store
                .save_group(Group {
                    id: GroupId(id),
                    name: name.to_string(),
                    description: None,
                })
                .await
                .unwrap();
        }
        store
            .save_user(User {
                id: UserId(7),
                username: "ed".to_string(),
                name: String::new(),
                surname: String::new(),
                emails: BTreeSet::new(),
                profile: Profile::RegisteredUser,
            })
            .await
            .unwrap();
        for (group, profile) in [(2, Profile::RegisteredUser), (3, Profile::Editor)] {
            store
                .save_user_group(UserGroup {
                    user_id: UserId(7),
                    group_id: GroupId(group),
                    profile,
                })
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn test_intranet_contains_v4() {
        let net = localhost_net();
        assert!(net.contains("127.10.0.3".parse().unwrap()));
        assert!(!net.contains("10.0.0.1".parse().unwrap()));
        assert!(!net.contains(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn test_intranet_contains_v6() {
        let net = IntranetNetwork::new(
            "fd00::".parse().unwrap(),
            "ffff:ffff::".parse().unwrap(),
        );
        assert!(net.contains("fd00:0:1::1".parse().unwrap()));
        assert!(!net.contains("fd01::1".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_anonymous_gets_network_groups_only() {
        let access = AccessManager::new(store().await).with_intranet(localhost_net());

        let groups = access
            .user_groups(&UserSession::anonymous(), "127.0.0.1".parse().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(groups, HashSet::from([GroupId(0), GroupId(1)]));

        let groups = access
            .user_groups(&UserSession::anonymous(), "192.168.1.4".parse().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(groups, HashSet::from([GroupId(1)]));
    }

    #[tokio::test]
    async fn test_member_gets_membership_groups() {
        let access = AccessManager::new(store().await);
        let session = UserSession::authenticated(UserId(7), "ed", Profile::RegisteredUser);

        let groups = access
            .user_groups(&session, "10.0.0.1".parse().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(groups, HashSet::from([GroupId(1), GroupId(2), GroupId(3)]));

        let editing = access
            .user_groups(&session, "10.0.0.1".parse().unwrap(), true)
            .await
            .unwrap();
        assert_eq!(editing, HashSet::from([GroupId(3)]));
    }

    #[tokio::test]
    async fn test_administrator_is_member_of_every_group() {
        let access = AccessManager::new(store().await);
        let session = UserSession::authenticated(UserId(1), "admin", Profile::Administrator);
        let groups = access
            .user_groups(&session, "10.0.0.1".parse().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(groups.len(), 4);
    }
}
