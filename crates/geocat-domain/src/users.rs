//! User lookup: resolve users by identifier, email, metadata ownership
//! and group membership.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use geocat_storage::{
    CatalogStore, Direction, MetadataId, Profile, Sort, SortField, SortValue, Sortable,
    StorageResult, User, UserGroup, UserGroupSpec, UserId,
};
use tracing::{debug, instrument, warn};

use crate::error::{DomainError, DomainResult};

/// Maps a storage not-found into `None`; other failures propagate.
fn optional<T>(result: StorageResult<T>) -> DomainResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// A joined (metadata, membership, user) row produced by the owner query.
#[derive(Debug, Clone)]
struct OwnerRow {
    metadata_id: MetadataId,
    membership: UserGroup,
    user: User,
}

impl Sortable for OwnerRow {
    fn sort_value(&self, field: SortField) -> SortValue<'_> {
        match field {
            SortField::MetadataId => SortValue::Int(self.metadata_id.0 as i64),
            SortField::GroupId | SortField::UserGroupProfile => self.membership.sort_value(field),
            _ => self.user.sort_value(field),
        }
    }
}

/// Resolves users against an explicit store handle.
pub struct UserLookup<S> {
    store: Arc<S>,
}

impl<S: CatalogStore> UserLookup<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Direct key lookup. A missing user is `None`, never an error.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        optional(self.store.get_user(id).await)
    }

    /// Same as [`find_by_id`](Self::find_by_id) for an identifier that
    /// arrives as a request string.
    pub async fn find_by_id_str(&self, id: &str) -> DomainResult<Option<User>> {
        let id: UserId = id.parse().map_err(|_| DomainError::InvalidIdentifier {
            value: id.to_string(),
        })?;
        self.find_by_id(id).await
    }

    /// Finds the user holding `email`.
    ///
    /// Several users sharing one address is a data inconsistency. It is
    /// logged once and the first match is returned.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let mut matches = self.store.find_users_by_email(email).await?;
        if matches.len() > 1 {
            let user_ids: Vec<i32> = matches.iter().map(|u| u.id.0).collect();
            warn!(
                email,
                ?user_ids,
                "email address is shared by more than one user, using the first match"
            );
        }
        if matches.is_empty() {
            return Ok(None);
        }
        Ok(Some(matches.swap_remove(0)))
    }

    /// Members of each record's owning group, one `(metadataId, user)` pair
    /// per match.
    ///
    /// `profile` restricts the memberships considered. Rows come back in
    /// metadata id then user id order, re-ordered by `sort` when given.
    #[instrument(skip(self, metadata_ids, sort))]
    pub async fn find_owners_of_metadata_ids(
        &self,
        metadata_ids: &[MetadataId],
        profile: Option<Profile>,
        sort: Option<&Sort>,
    ) -> DomainResult<Vec<(MetadataId, User)>> {
        let ids: BTreeSet<MetadataId> = metadata_ids.iter().copied().collect();
        let mut rows = Vec::new();
        let mut seen = HashSet::new();

        for metadata_id in ids {
            let Some(metadata) = optional(self.store.get_metadata(metadata_id).await)? else {
                debug!(%metadata_id, "skipping unknown metadata");
                continue;
            };
            let Some(group_id) = metadata.source_info.group_owner else {
                continue;
            };

            let mut spec = UserGroupSpec::has_group_id(group_id);
            if let Some(profile) = profile {
                spec = spec.and(UserGroupSpec::has_profile(profile));
            }

            for membership in self.store.find_user_groups(&spec, None).await? {
                if !seen.insert((metadata_id, membership.user_id)) {
                    continue;
                }
                let Some(user) = optional(self.store.get_user(membership.user_id).await)? else {
                    continue;
                };
                rows.push(OwnerRow {
                    metadata_id,
                    membership,
                    user,
                });
            }
        }

        let default_order =
            Sort::asc(SortField::MetadataId).then(SortField::UserId, Direction::Asc);
        default_order.apply(&mut rows);
        if let Some(sort) = sort {
            sort.apply(&mut rows);
        }

        Ok(rows
            .into_iter()
            .map(|row| (row.metadata_id, row.user))
            .collect())
    }

    /// Distinct users recorded as the owner of at least one metadata record.
    #[instrument(skip(self))]
    pub async fn find_all_users_that_own_any_metadata(&self) -> DomainResult<Vec<User>> {
        let owners: BTreeSet<UserId> = self
            .store
            .list_metadata()
            .await?
            .into_iter()
            .map(|md| md.source_info.owner)
            .collect();
        self.load_users(owners).await
    }

    /// Distinct users holding at least one membership that satisfies `filter`.
    #[instrument(skip(self))]
    pub async fn find_all_users_in_groups(
        &self,
        filter: &UserGroupSpec,
    ) -> DomainResult<Vec<User>> {
        let members: BTreeSet<UserId> = self
            .store
            .find_user_groups(filter, None)
            .await?
            .into_iter()
            .map(|row| row.user_id)
            .collect();
        self.load_users(members).await
    }

    async fn load_users(&self, ids: BTreeSet<UserId>) -> DomainResult<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = optional(self.store.get_user(id).await)? {
                users.push(user);
            }
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use geocat_storage::{
        Group, GroupId, MemoryCatalogStore, Metadata, MetadataSourceInfo,
    };
    use tracing_test::traced_test;

    use super::*;

    fn user(id: i32, username: &str, surname: &str, emails: &[&str]) -> User {
        User {
            id: UserId(id),
            username: username.to_string(),
            name: String::new(),
            surname: surname.to_string(),
            emails: emails.iter().map(|e| e.to_string()).collect(),
            profile: Profile::RegisteredUser,
        }
    }

    async fn membership(store: &MemoryCatalogStore, user: i32, group: i32, profile: Profile) {
        store
            .save_user_group(UserGroup {
                user_id: UserId(user),
                group_id: GroupId(group),
                profile,
            })
            .await
            .unwrap();
    }

    async fn metadata(store: &MemoryCatalogStore, id: i32, owner: i32, group: Option<i32>) {
        store
            .save_metadata(Metadata {
                id: MetadataId(id),
                uuid: format!("uuid-{id}"),
                source_info: MetadataSourceInfo {
                    owner: UserId(owner),
                    group_owner: group.map(GroupId),
                    source_id: None,
                },
            })
            .await
            .unwrap();
    }

    /// Users 1..=4, groups 10 and 20, three records.
    async fn seeded() -> Arc<MemoryCatalogStore> {
        let store = MemoryCatalogStore::new_shared();
        store.save_user(user(1, "ann", "Zed", &["ann@example.com"])).await.unwrap();
        store.save_user(user(2, "bob", "Young", &["bob@example.com"])).await.unwrap();
        store.save_user(user(3, "cid", "Xu", &["cid@example.com"])).await.unwrap();
        store.save_user(user(4, "dee", "Walsh", &[])).await.unwrap();
        for id in [10, 20] {
            store
                .save_group(Group {
                    id: GroupId(id),
                    name: format!("group-{id}"),
                    description: None,
                })
                .await
                .unwrap();
        }
        membership(&store, 1, 10, Profile::Editor).await;
        membership(&store, 2, 10, Profile::Reviewer).await;
        membership(&store, 3, 20, Profile::Editor).await;
        membership(&store, 4, 20, Profile::RegisteredUser).await;

        metadata(&store, 100, 1, Some(10)).await;
        metadata(&store, 101, 1, Some(20)).await;
        metadata(&store, 102, 3, None).await;
        store
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let lookup = UserLookup::new(seeded().await);
        assert_eq!(
            lookup.find_by_id(UserId(2)).await.unwrap().unwrap().username,
            "bob"
        );
        assert!(lookup.find_by_id(UserId(404)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_id_str() {
        let lookup = UserLookup::new(seeded().await);
        assert!(lookup.find_by_id_str(" 3 ").await.unwrap().is_some());
        assert!(matches!(
            lookup.find_by_id_str("three").await,
            Err(DomainError::InvalidIdentifier { value }) if value == "three"
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_find_by_email_unique_and_missing() {
        let lookup = UserLookup::new(seeded().await);
        let found = lookup.find_by_email("cid@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, UserId(3));
        assert!(lookup.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(!logs_contain("more than one user"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_find_by_email_shared_address_warns_once() {
        let store = seeded().await;
        store.save_user(user(5, "eve", "", &["a@b.com"])).await.unwrap();
        store.save_user(user(6, "fay", "", &["a@b.com", "fay@example.com"])).await.unwrap();
        let lookup = UserLookup::new(store);

        let found = lookup.find_by_email("a@b.com").await.unwrap().unwrap();
        assert!(found.id == UserId(5) || found.id == UserId(6));

        logs_assert(|lines: &[&str]| {
            let warnings = lines
                .iter()
                .filter(|line| line.contains("WARN") && line.contains("more than one user"))
                .count();
            match warnings {
                1 => Ok(()),
                n => Err(format!("expected one warning, got {n}")),
            }
        });
    }

    #[tokio::test]
    async fn test_owners_of_metadata_default_order() {
        let lookup = UserLookup::new(seeded().await);
        let owners = lookup
            .find_owners_of_metadata_ids(
                &[MetadataId(101), MetadataId(100), MetadataId(100), MetadataId(102)],
                None,
                None,
            )
            .await
            .unwrap();
        let pairs: Vec<(i32, i32)> = owners.iter().map(|(md, u)| (md.0, u.id.0)).collect();
        assert_eq!(pairs, vec![(100, 1), (100, 2), (101, 3), (101, 4)]);
    }

    #[tokio::test]
    async fn test_owners_of_metadata_filtered_by_profile() {
        let lookup = UserLookup::new(seeded().await);
        let owners = lookup
            .find_owners_of_metadata_ids(
                &[MetadataId(100), MetadataId(101)],
                Some(Profile::Editor),
                None,
            )
            .await
            .unwrap();
        let pairs: Vec<(i32, i32)> = owners.iter().map(|(md, u)| (md.0, u.id.0)).collect();
        assert_eq!(pairs, vec![(100, 1), (101, 3)]);
    }

    #[tokio::test]
    async fn test_owners_of_metadata_with_caller_sort() {
        let lookup = UserLookup::new(seeded().await);
        let sort = Sort::asc(SortField::Surname);
        let owners = lookup
            .find_owners_of_metadata_ids(&[MetadataId(100), MetadataId(101)], None, Some(&sort))
            .await
            .unwrap();
        let surnames: Vec<&str> = owners.iter().map(|(_, u)| u.surname.as_str()).collect();
        assert_eq!(surnames, vec!["Walsh", "Xu", "Young", "Zed"]);
    }

    #[tokio::test]
    async fn test_owners_of_unknown_metadata_is_empty() {
        let lookup = UserLookup::new(seeded().await);
        let owners = lookup
            .find_owners_of_metadata_ids(&[MetadataId(9)], None, None)
            .await
            .unwrap();
        assert!(owners.is_empty());
    }

    #[tokio::test]
    async fn test_users_that_own_any_metadata() {
        let lookup = UserLookup::new(seeded().await);
        let ids: Vec<UserId> = lookup
            .find_all_users_that_own_any_metadata()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![UserId(1), UserId(3)]);
    }

    #[tokio::test]
    async fn test_users_in_groups() {
        let lookup = UserLookup::new(seeded().await);

        let editors = lookup
            .find_all_users_in_groups(&UserGroupSpec::has_profile(Profile::Editor))
            .await
            .unwrap();
        assert_eq!(editors.iter().map(|u| u.id.0).collect::<Vec<_>>(), vec![1, 3]);

        let group_twenty = lookup
            .find_all_users_in_groups(&UserGroupSpec::has_group_ids([GroupId(20)]))
            .await
            .unwrap();
        assert_eq!(
            group_twenty.iter().map(|u| u.id.0).collect::<Vec<_>>(),
            vec![3, 4]
        );

        let nobody = lookup
            .find_all_users_in_groups(&UserGroupSpec::has_group_id(GroupId(99)))
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }
}
