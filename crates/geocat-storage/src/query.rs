//! Composable query specifications and sort orders.
//!
//! A spec is a predicate tree over one entity, combined with explicit
//! `and` / `or` / `not`. Backends evaluate it however suits them; the
//! in-memory store calls [`UserGroupSpec::matches`] row by row.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::model::{
    GroupId, MetadataId, OperationAllowed, OperationId, Profile, User, UserGroup, UserId,
};

/// Predicate over [`UserGroup`] rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserGroupSpec {
    /// Matches every row.
    All,
    UserId(UserId),
    GroupId(GroupId),
    GroupIdIn(BTreeSet<GroupId>),
    Profile(Profile),
    ProfileIn(BTreeSet<Profile>),
    And(Box<UserGroupSpec>, Box<UserGroupSpec>),
    Or(Box<UserGroupSpec>, Box<UserGroupSpec>),
    Not(Box<UserGroupSpec>),
}

impl UserGroupSpec {
    pub fn has_user_id(user_id: UserId) -> Self {
        UserGroupSpec::UserId(user_id)
    }

    pub fn has_group_id(group_id: GroupId) -> Self {
        UserGroupSpec::GroupId(group_id)
    }

    pub fn has_group_ids<I: IntoIterator<Item = GroupId>>(group_ids: I) -> Self {
        UserGroupSpec::GroupIdIn(group_ids.into_iter().collect())
    }

    pub fn has_profile(profile: Profile) -> Self {
        UserGroupSpec::Profile(profile)
    }

    pub fn and(self, rhs: UserGroupSpec) -> Self {
        UserGroupSpec::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: UserGroupSpec) -> Self {
        UserGroupSpec::Or(Box::new(self), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        UserGroupSpec::Not(Box::new(self))
    }

    pub fn matches(&self, row: &UserGroup) -> bool {
        match self {
            UserGroupSpec::All => true,
            UserGroupSpec::UserId(id) => row.user_id == *id,
            UserGroupSpec::GroupId(id) => row.group_id == *id,
            UserGroupSpec::GroupIdIn(ids) => ids.contains(&row.group_id),
            UserGroupSpec::Profile(p) => row.profile == *p,
            UserGroupSpec::ProfileIn(ps) => ps.contains(&row.profile),
            UserGroupSpec::And(a, b) => a.matches(row) && b.matches(row),
            UserGroupSpec::Or(a, b) => a.matches(row) || b.matches(row),
            UserGroupSpec::Not(inner) => !inner.matches(row),
        }
    }
}

/// Predicate over [`OperationAllowed`] rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationAllowedSpec {
    All,
    MetadataId(MetadataId),
    GroupId(GroupId),
    OperationId(OperationId),
    And(Box<OperationAllowedSpec>, Box<OperationAllowedSpec>),
    Or(Box<OperationAllowedSpec>, Box<OperationAllowedSpec>),
    Not(Box<OperationAllowedSpec>),
}

impl OperationAllowedSpec {
    pub fn has_metadata_id(metadata_id: MetadataId) -> Self {
        OperationAllowedSpec::MetadataId(metadata_id)
    }

    pub fn has_group_id(group_id: GroupId) -> Self {
        OperationAllowedSpec::GroupId(group_id)
    }

    pub fn has_operation_id(operation_id: OperationId) -> Self {
        OperationAllowedSpec::OperationId(operation_id)
    }

    pub fn and(self, rhs: OperationAllowedSpec) -> Self {
        OperationAllowedSpec::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: OperationAllowedSpec) -> Self {
        OperationAllowedSpec::Or(Box::new(self), Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        OperationAllowedSpec::Not(Box::new(self))
    }

    /// The metadata id every matching row must carry, if the spec pins one.
    pub fn pinned_metadata_id(&self) -> Option<MetadataId> {
        match self {
            OperationAllowedSpec::MetadataId(id) => Some(*id),
            OperationAllowedSpec::And(a, b) => a
                .pinned_metadata_id()
                .or_else(|| b.pinned_metadata_id()),
            OperationAllowedSpec::Or(a, b) => {
                let id = a.pinned_metadata_id()?;
                (b.pinned_metadata_id() == Some(id)).then_some(id)
            }
            _ => None,
        }
    }

    pub fn matches(&self, row: &OperationAllowed) -> bool {
        match self {
            OperationAllowedSpec::All => true,
            OperationAllowedSpec::MetadataId(id) => row.metadata_id == *id,
            OperationAllowedSpec::GroupId(id) => row.group_id == *id,
            OperationAllowedSpec::OperationId(id) => row.operation_id == *id,
            OperationAllowedSpec::And(a, b) => a.matches(row) && b.matches(row),
            OperationAllowedSpec::Or(a, b) => a.matches(row) || b.matches(row),
            OperationAllowedSpec::Not(inner) => !inner.matches(row),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Columns a sort may reference across metadata, membership and user rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    MetadataId,
    UserId,
    Username,
    Name,
    Surname,
    UserProfile,
    GroupId,
    UserGroupProfile,
}

/// Value of a sortable column.
///
/// `Missing` orders before any present value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Missing,
    Int(i64),
    Text(&'a str),
}

/// Rows that can be ordered by a [`Sort`].
pub trait Sortable {
    fn sort_value(&self, field: SortField) -> SortValue<'_>;
}

impl Sortable for User {
    fn sort_value(&self, field: SortField) -> SortValue<'_> {
        match field {
            SortField::UserId => SortValue::Int(self.id.0 as i64),
            SortField::Username => SortValue::Text(&self.username),
            SortField::Name => SortValue::Text(&self.name),
            SortField::Surname => SortValue::Text(&self.surname),
            SortField::UserProfile => SortValue::Text(self.profile.as_str()),
            _ => SortValue::Missing,
        }
    }
}

impl Sortable for UserGroup {
    fn sort_value(&self, field: SortField) -> SortValue<'_> {
        match field {
            SortField::UserId => SortValue::Int(self.user_id.0 as i64),
            SortField::GroupId => SortValue::Int(self.group_id.0 as i64),
            SortField::UserGroupProfile => SortValue::Text(self.profile.as_str()),
            _ => SortValue::Missing,
        }
    }
}

/// One component of a [`Sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub field: SortField,
    pub direction: Direction,
}

/// Caller-supplied ordering, applied field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    pub orders: Vec<Order>,
}

impl Sort {
    pub fn by(field: SortField, direction: Direction) -> Self {
        Self {
            orders: vec![Order { field, direction }],
        }
    }

    pub fn asc(field: SortField) -> Self {
        Self::by(field, Direction::Asc)
    }

    pub fn desc(field: SortField) -> Self {
        Self::by(field, Direction::Desc)
    }

    /// Appends a tie-breaking order.
    pub fn then(mut self, field: SortField, direction: Direction) -> Self {
        self.orders.push(Order { field, direction });
        self
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn compare<T: Sortable + ?Sized>(&self, a: &T, b: &T) -> Ordering {
        for order in &self.orders {
            let ord = a.sort_value(order.field).cmp(&b.sort_value(order.field));
            let ord = match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable sort, so rows equal under every order keep their input order.
    pub fn apply<T: Sortable>(&self, rows: &mut [T]) {
        if self.is_unsorted() {
            return;
        }
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ug(user: i32, group: i32, profile: Profile) -> UserGroup {
        UserGroup {
            user_id: UserId(user),
            group_id: GroupId(group),
            profile,
        }
    }

    #[test]
    fn test_user_group_spec_combinators() {
        let row = ug(7, 3, Profile::Editor);

        let spec = UserGroupSpec::has_user_id(UserId(7)).and(UserGroupSpec::has_group_id(GroupId(3)));
        assert!(spec.matches(&row));

        let spec = UserGroupSpec::has_user_id(UserId(8)).and(UserGroupSpec::has_group_id(GroupId(3)));
        assert!(!spec.matches(&row));

        let spec = UserGroupSpec::has_user_id(UserId(8)).or(UserGroupSpec::has_profile(Profile::Editor));
        assert!(spec.matches(&row));

        assert!(!UserGroupSpec::All.not().matches(&row));
        assert!(UserGroupSpec::has_group_ids([GroupId(1), GroupId(3)]).matches(&row));
        assert!(!UserGroupSpec::has_group_ids(Vec::new()).matches(&row));
    }

    #[test]
    fn test_operation_allowed_spec_combinators() {
        let row = OperationAllowed::new(MetadataId(42), GroupId(3), OperationId(2));
        let spec = OperationAllowedSpec::has_metadata_id(MetadataId(42))
            .and(OperationAllowedSpec::has_group_id(GroupId(3)));
        assert!(spec.matches(&row));
        assert!(!spec
            .clone()
            .and(OperationAllowedSpec::has_operation_id(OperationId(1)))
            .matches(&row));
        assert!(OperationAllowedSpec::has_operation_id(OperationId(1))
            .not()
            .matches(&row));
    }

    #[test]
    fn test_sort_applies_orders_in_sequence() {
        let mut rows = vec![
            ug(2, 1, Profile::Reviewer),
            ug(1, 2, Profile::Editor),
            ug(3, 1, Profile::Editor),
        ];
        Sort::asc(SortField::UserGroupProfile)
            .then(SortField::UserId, Direction::Desc)
            .apply(&mut rows);

        let users: Vec<i32> = rows.iter().map(|r| r.user_id.0).collect();
        assert_eq!(users, vec![3, 1, 2]);
    }

    #[test]
    fn test_unsorted_keeps_input_order() {
        let mut rows = vec![ug(3, 1, Profile::Editor), ug(1, 1, Profile::Editor)];
        Sort::default().apply(&mut rows);
        assert_eq!(rows[0].user_id, UserId(3));
    }

    #[test]
    fn test_pinned_metadata_id() {
        let on_42 = OperationAllowedSpec::has_metadata_id(MetadataId(42));
        let on_43 = OperationAllowedSpec::has_metadata_id(MetadataId(43));
        let in_group = OperationAllowedSpec::has_group_id(GroupId(3));

        assert_eq!(
            in_group.clone().and(on_42.clone()).pinned_metadata_id(),
            Some(MetadataId(42))
        );
        assert_eq!(
            on_42.clone().or(on_42.clone()).pinned_metadata_id(),
            Some(MetadataId(42))
        );
        assert_eq!(on_42.clone().or(on_43).pinned_metadata_id(), None);
        assert_eq!(on_42.clone().or(in_group.clone()).pinned_metadata_id(), None);
        assert_eq!(on_42.not().pinned_metadata_id(), None);
        assert_eq!(in_group.pinned_metadata_id(), None);
    }

    struct Row(Option<i64>);

    impl Sortable for Row {
        fn sort_value(&self, _field: SortField) -> SortValue<'_> {
            self.0.map_or(SortValue::Missing, SortValue::Int)
        }
    }

    #[test]
    fn test_missing_values_sort_first() {
        let mut rows = vec![Row(Some(2)), Row(None), Row(Some(1))];
        Sort::asc(SortField::UserId).apply(&mut rows);
        let values: Vec<Option<i64>> = rows.iter().map(|r| r.0).collect();
        assert_eq!(values, vec![None, Some(1), Some(2)]);

        Sort::desc(SortField::UserId).apply(&mut rows);
        let values: Vec<Option<i64>> = rows.iter().map(|r| r.0).collect();
        assert_eq!(values, vec![Some(2), Some(1), None]);
    }
}
