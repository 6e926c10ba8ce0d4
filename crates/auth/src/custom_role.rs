//! Tenant-defined roles and effective-permission resolution.
//!
//! A custom role's effective set is always
//! `(catalog[base] ∪ added) \ removed`. Removal is applied last, so a grant
//! listed in both `added` and `removed` ends up absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buildpro_core::{DomainError, DomainResult, RoleId, TenantId};

use crate::catalog::PermissionCatalog;
use crate::permissions::{Permission, PermissionSet, deserialize_lenient};
use crate::roles::{CanonicalRole, RoleRef};

/// Stored role record, as read from the tenant's role table.
///
/// # Invariants
/// - `is_system` records mirror a canonical role and are never edited or
///   deleted. The decision core only reads them; role-management code must call
///   [`CustomRole::ensure_mutable`] before writing.
/// - A soft-deleted role resolves to an empty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    pub id: RoleId,
    /// `None` only for system roles, which are shared by every tenant.
    pub tenant_id: Option<TenantId>,
    pub name: String,
    pub base_role: CanonicalRole,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub added: Vec<Permission>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub removed: Vec<Permission>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CustomRole {
    pub fn new(
        id: RoleId,
        tenant_id: TenantId,
        name: impl Into<String>,
        base_role: CanonicalRole,
    ) -> Self {
        Self {
            id,
            tenant_id: Some(tenant_id),
            name: name.into(),
            base_role,
            added: Vec::new(),
            removed: Vec::new(),
            is_system: false,
            deleted_at: None,
        }
    }

    /// The immutable record standing for a canonical role.
    pub fn system(id: RoleId, role: CanonicalRole) -> Self {
        Self {
            id,
            tenant_id: None,
            name: role.as_str().to_string(),
            base_role: role,
            added: Vec::new(),
            removed: Vec::new(),
            is_system: true,
            deleted_at: None,
        }
    }

    pub fn with_added(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.added.extend(permissions);
        self
    }

    pub fn with_removed(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.removed.extend(permissions);
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Precondition for any edit or delete issued by tenant administrators.
    pub fn ensure_mutable(&self) -> DomainResult<()> {
        if self.is_system {
            return Err(DomainError::invariant(format!(
                "system role '{}' cannot be modified",
                self.name
            )));
        }
        if self.is_deleted() {
            return Err(DomainError::invariant(format!("role '{}' is deleted", self.name)));
        }
        Ok(())
    }

    /// How the engine should rank an actor holding this role.
    pub fn role_ref(&self) -> RoleRef {
        if self.is_system {
            RoleRef::Canonical(self.base_role)
        } else {
            RoleRef::Custom {
                id: self.id,
                base: self.base_role,
            }
        }
    }

    /// Effective grants under `catalog`; empty once soft-deleted.
    pub fn effective_permissions(&self, catalog: &PermissionCatalog) -> PermissionSet {
        CustomRoleResolver::new(catalog).resolve_role(self)
    }

    /// Which edits actually change the base role's defaults.
    pub fn net_changes(&self, catalog: &PermissionCatalog) -> RoleDelta {
        let base = catalog.defaults(self.base_role);
        let effective = self.effective_permissions(catalog);
        RoleDelta {
            granted_beyond_base: effective
                .iter()
                .filter(|p| !base.contains(p))
                .cloned()
                .collect(),
            revoked_from_base: base
                .iter()
                .filter(|p| !effective.contains(p))
                .cloned()
                .collect(),
        }
    }
}

/// Difference between a custom role and its base role (audit display).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleDelta {
    pub granted_beyond_base: Vec<Permission>,
    pub revoked_from_base: Vec<Permission>,
}

/// Computes effective permission sets from a catalog.
#[derive(Debug, Clone, Copy)]
pub struct CustomRoleResolver<'c> {
    catalog: &'c PermissionCatalog,
}

impl<'c> CustomRoleResolver<'c> {
    pub const fn new(catalog: &'c PermissionCatalog) -> Self {
        Self { catalog }
    }

    /// `(defaults(base) ∪ added) \ removed`. Pure; removal wins ties.
    pub fn resolve(
        &self,
        base: CanonicalRole,
        added: &[Permission],
        removed: &[Permission],
    ) -> PermissionSet {
        let mut set = self.catalog.defaults(base);
        set.extend(added.iter().cloned());
        for permission in removed {
            set.remove(permission);
        }
        tracing::trace!(
            base = %base,
            added = added.len(),
            removed = removed.len(),
            effective = set.len(),
            "resolved role permissions"
        );
        set
    }

    /// Effective grants of a stored record; empty once soft-deleted.
    pub fn resolve_role(&self, role: &CustomRole) -> PermissionSet {
        if role.is_deleted() {
            tracing::debug!(role_id = %role.id, "resolving deleted role to empty set");
            return PermissionSet::new();
        }
        self.resolve(role.base_role, &role.added, &role.removed)
    }

    /// Like [`CustomRoleResolver::resolve`] over stored strings. Malformed
    /// entries are dropped on both lists.
    pub fn resolve_strings<S: AsRef<str>>(
        &self,
        base: CanonicalRole,
        added: &[S],
        removed: &[S],
    ) -> PermissionSet {
        let added: Vec<Permission> =
            PermissionSet::from_strings_lenient(added).into_iter().collect();
        let removed: Vec<Permission> =
            PermissionSet::from_strings_lenient(removed).into_iter().collect();
        self.resolve(base, &added, &removed)
    }
}

impl Default for CustomRoleResolver<'static> {
    fn default() -> Self {
        Self::new(PermissionCatalog::builtin())
    }
}

/// Resolve against the stock catalog.
pub fn resolve(base: CanonicalRole, added: &[Permission], removed: &[Permission]) -> PermissionSet {
    CustomRoleResolver::default().resolve(base, added, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::defaults;
    use proptest::prelude::*;

    fn perm(s: &str) -> Permission {
        s.parse().unwrap()
    }

    fn any_role() -> impl Strategy<Value = CanonicalRole> {
        prop::sample::select(CanonicalRole::ALL.to_vec())
    }

    fn any_permission() -> impl Strategy<Value = Permission> {
        (
            prop::sample::select(vec![
                "jobs",
                "budgets",
                "billing",
                "daily_logs",
                "warranty_claims",
            ]),
            prop::sample::select(vec!["read", "create", "update", "approve"]),
            prop::sample::select(crate::Scope::ALL.to_vec()),
        )
            .prop_map(|(r, a, s)| Permission::new(r, a, s).unwrap())
    }

    #[test]
    fn empty_edits_yield_catalog_defaults() {
        for role in CanonicalRole::ALL {
            assert_eq!(resolve(role, &[], &[]), defaults(role));
        }
    }

    #[test]
    fn added_grant_joins_defaults() {
        let set = resolve(CanonicalRole::Office, &[perm("change_orders:approve:all")], &[]);
        assert!(set.contains_str("change_orders:approve:all"));
        for p in &defaults(CanonicalRole::Office) {
            assert!(set.contains(p), "missing default {p}");
        }
        assert!(set.contains_str("jobs:read:all"));
    }

    #[test]
    fn removed_grant_leaves_other_defaults() {
        let set = resolve(CanonicalRole::Pm, &[], &[perm("budgets:update:all")]);
        assert!(!set.contains_str("budgets:update:all"));
        assert!(set.contains_str("jobs:create:all"));
        assert_eq!(set.len(), defaults(CanonicalRole::Pm).len() - 1);
    }

    #[test]
    fn removing_every_default_yields_empty_set() {
        let everything: Vec<Permission> = defaults(CanonicalRole::Field).into_iter().collect();
        assert!(resolve(CanonicalRole::Field, &[], &everything).is_empty());
    }

    #[test]
    fn no_op_edits() {
        let present = resolve(CanonicalRole::Pm, &[perm("jobs:read:all")], &[]);
        let absent = resolve(CanonicalRole::Pm, &[], &[perm("billing:manage:all")]);
        assert_eq!(present, defaults(CanonicalRole::Pm));
        assert_eq!(absent, defaults(CanonicalRole::Pm));
    }

    #[test]
    fn resolve_strings_drops_malformed_entries() {
        let resolver = CustomRoleResolver::default();
        let set = resolver.resolve_strings(
            CanonicalRole::Field,
            &["warranty_claims:create:own", "warranty claims:create:own"],
            &["daily_logs:update:own", "daily_logs:update"],
        );
        assert!(set.contains_str("warranty_claims:create:own"));
        assert!(!set.contains_str("daily_logs:update:own"));
        assert_eq!(set.len(), defaults(CanonicalRole::Field).len());
    }

    #[test]
    fn system_role_is_immutable() {
        let role = CustomRole::system(RoleId::new(), CanonicalRole::Admin);
        let err = role.ensure_mutable().unwrap_err();
        assert!(err.to_string().contains("system role 'admin'"));
        assert_eq!(role.role_ref(), RoleRef::Canonical(CanonicalRole::Admin));
        assert_eq!(
            role.effective_permissions(PermissionCatalog::builtin()),
            defaults(CanonicalRole::Admin)
        );
    }

    #[test]
    fn tenant_role_is_mutable_until_deleted() {
        let mut role =
            CustomRole::new(RoleId::new(), TenantId::new(), "Estimator", CanonicalRole::Office);
        assert!(role.ensure_mutable().is_ok());
        assert!(matches!(role.role_ref(), RoleRef::Custom { base: CanonicalRole::Office, .. }));

        role.deleted_at = Some(Utc::now());
        assert!(role.ensure_mutable().is_err());
        assert!(role.effective_permissions(PermissionCatalog::builtin()).is_empty());
    }

    #[test]
    fn net_changes_report_real_edits_only() {
        let role = CustomRole::new(RoleId::new(), TenantId::new(), "Lead PM", CanonicalRole::Pm)
            .with_added([perm("jobs:delete:all"), perm("jobs:read:all")])
            .with_removed([perm("budgets:update:all"), perm("billing:read:all")]);

        let delta = role.net_changes(PermissionCatalog::builtin());
        assert_eq!(delta.granted_beyond_base, [perm("jobs:delete:all")]);
        assert_eq!(delta.revoked_from_base, [perm("budgets:update:all")]);
    }

    #[test]
    fn stored_record_round_trips_through_json() {
        let role =
            CustomRole::new(RoleId::new(), TenantId::new(), "Estimator", CanonicalRole::Office)
                .with_added([perm("change_orders:approve:all")]);
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["base_role"], "office");
        assert_eq!(json["added"][0], "change_orders:approve:all");

        let back: CustomRole = serde_json::from_value(json).unwrap();
        assert_eq!(back, role);
    }

    #[test]
    fn stored_record_drops_malformed_grants() {
        let json = serde_json::json!({
            "id": RoleId::new(),
            "tenant_id": TenantId::new(),
            "name": "Estimator",
            "base_role": "office",
            "added": ["change_orders:approve:all", "change orders:approve:all"],
            "removed": ["jobs:update", "jobs:create:all"],
        });
        let role: CustomRole = serde_json::from_value(json).unwrap();
        assert_eq!(role.added, [perm("change_orders:approve:all")]);
        assert_eq!(role.removed, [perm("jobs:create:all")]);

        let set = role.effective_permissions(PermissionCatalog::builtin());
        assert!(set.contains_str("change_orders:approve:all"));
        assert!(!set.contains_str("jobs:create:all"));
        assert!(set.contains_str("jobs:update:all"));
    }

    proptest! {
        #[test]
        fn removal_wins_over_addition(role in any_role(), p in any_permission()) {
            let set = resolve(role, &[p.clone()], &[p.clone()]);
            prop_assert!(!set.contains(&p));
        }

        #[test]
        fn resolve_is_idempotent(
            role in any_role(),
            added in prop::collection::vec(any_permission(), 0..8),
            removed in prop::collection::vec(any_permission(), 0..8),
        ) {
            let first = resolve(role, &added, &removed);
            prop_assert_eq!(&first, &resolve(role, &added, &removed));

            let again: Vec<Permission> = first.iter().cloned().collect();
            prop_assert_eq!(&first, &resolve(role, &again, &removed));
        }

        #[test]
        fn effective_set_matches_set_algebra(
            role in any_role(),
            added in prop::collection::vec(any_permission(), 0..8),
            removed in prop::collection::vec(any_permission(), 0..8),
        ) {
            let set = resolve(role, &added, &removed);
            for p in defaults(role).iter().chain(added.iter()) {
                prop_assert_eq!(set.contains(p), !removed.contains(p));
            }
            for p in &set {
                prop_assert!(defaults(role).contains(p) || added.contains(p));
            }
        }
    }
}
