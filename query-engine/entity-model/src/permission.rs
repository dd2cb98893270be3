//! Per-operation gating of fields.
//!
//! Every field carries one [`PermissionSet`] per [`Operation`]. An empty set behaves like
//! [`Permission::Allow`].

use crate::{FieldSpec, Operation};
use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};
use std::fmt;

#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// The field never appears in a type generated for the operation.
    Deny,
    /// The field is mandatory for the operation.
    Require,
    Allow,
    /// The field value identifies at most one record.
    Unique,
    /// The field is the primary identity of the record.
    Primary,
    /// Excluded from read projections, still filterable.
    Ignore,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Deny => "deny",
            Permission::Require => "require",
            Permission::Allow => "allow",
            Permission::Unique => "unique",
            Permission::Primary => "primary",
            Permission::Ignore => "ignore",
        };

        f.write_str(s)
    }
}

pub type PermissionSet = BitFlags<Permission>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    create: PermissionSet,
    read: PermissionSet,
    update: PermissionSet,
    delete: PermissionSet,
}

impl Permissions {
    pub fn get(&self, op: Operation) -> PermissionSet {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    pub fn insert(&mut self, op: Operation, permission: impl Into<PermissionSet>) {
        let slot = match op {
            Operation::Create => &mut self.create,
            Operation::Read => &mut self.read,
            Operation::Update => &mut self.update,
            Operation::Delete => &mut self.delete,
        };

        *slot |= permission.into();
    }

    /// Whether any operation carries the given flag.
    pub fn any(&self, permission: Permission) -> bool {
        Operation::ALL.iter().any(|op| self.get(*op).contains(permission))
    }

    /// Operations whose set holds both `Deny` and `Require`.
    pub fn conflicts(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL
            .into_iter()
            .filter(|op| self.get(*op).contains(Permission::Deny | Permission::Require))
    }
}

/// Whether the field may appear at all in a type generated for `op`.
pub fn is_visible(field: &FieldSpec, op: Operation) -> bool {
    !field.permissions.get(op).contains(Permission::Deny)
}

/// Whether the field must be supplied for `op`.
pub fn is_required(field: &FieldSpec, op: Operation) -> bool {
    let set = field.permissions.get(op);

    set.contains(Permission::Require) && !set.contains(Permission::Deny)
}

/// Whether the field belongs to the default read projection.
pub fn is_projected(field: &FieldSpec) -> bool {
    let set = field.permissions.get(Operation::Read);

    !set.intersects(Permission::Deny | Permission::Ignore)
}

/// Whether values of the field identify a record on their own, for any operation.
pub fn is_unique(field: &FieldSpec) -> bool {
    field.permissions.any(Permission::Unique) || field.permissions.any(Permission::Primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScalarKind;

    #[test]
    fn deny_hides_only_its_operation() {
        let field = FieldSpec::scalar("password", ScalarKind::String)
            .require(Operation::Create)
            .deny(Operation::Read);

        assert!(is_visible(&field, Operation::Create));
        assert!(is_required(&field, Operation::Create));
        assert!(!is_visible(&field, Operation::Read));
        assert!(!is_projected(&field));
        assert!(is_visible(&field, Operation::Update));
        assert!(!is_required(&field, Operation::Update));
    }

    #[test]
    fn ignore_keeps_the_field_visible_but_unprojected() {
        let field = FieldSpec::scalar("geo_collection", ScalarKind::Geometry).ignore(Operation::Read);

        assert!(is_visible(&field, Operation::Read));
        assert!(!is_projected(&field));
    }

    #[test]
    fn unique_and_primary_flags_are_detected_on_any_operation() {
        let id = FieldSpec::scalar("id", ScalarKind::Int).primary();
        let username = FieldSpec::scalar("username", ScalarKind::String).unique();
        let email = FieldSpec::scalar("email", ScalarKind::String);

        assert!(is_unique(&id));
        assert!(is_unique(&username));
        assert!(!is_unique(&email));
    }

    #[test]
    fn deny_and_require_together_is_a_conflict() {
        let mut permissions = Permissions::default();
        permissions.insert(Operation::Update, Permission::Deny | Permission::Require);

        assert_eq!(permissions.conflicts().collect::<Vec<_>>(), vec![Operation::Update]);
    }
}
