//! Built-in default grants for each canonical role.
//!
//! The tables are `static` data assembled at compile time. Nothing mutates
//! them; [`PermissionCatalog`] is a thin read-only view that callers can also
//! construct over their own tables (tests, staged rollouts).

use serde::Serialize;

use crate::permissions::{Permission, PermissionSet, Scope};
use crate::roles::{CanonicalRole, RoleRef};

const fn all(resource: &'static str, action: &'static str) -> Permission {
    Permission::from_static(resource, action, Scope::All)
}

const fn own(resource: &'static str, action: &'static str) -> Permission {
    Permission::from_static(resource, action, Scope::Own)
}

const fn assigned(resource: &'static str, action: &'static str) -> Permission {
    Permission::from_static(resource, action, Scope::Assigned)
}

const fn none(resource: &'static str, action: &'static str) -> Permission {
    Permission::from_static(resource, action, Scope::None)
}

const OWNER: &[Permission] = &[
    all("jobs", "read"),
    all("jobs", "create"),
    all("jobs", "update"),
    all("jobs", "delete"),
    all("estimates", "read"),
    all("estimates", "create"),
    all("estimates", "update"),
    all("estimates", "delete"),
    all("budgets", "read"),
    all("budgets", "create"),
    all("budgets", "update"),
    all("budgets", "delete"),
    all("change_orders", "read"),
    all("change_orders", "create"),
    all("change_orders", "update"),
    all("change_orders", "delete"),
    all("change_orders", "approve"),
    all("schedules", "read"),
    all("schedules", "create"),
    all("schedules", "update"),
    all("schedules", "delete"),
    all("daily_logs", "read"),
    all("daily_logs", "create"),
    all("daily_logs", "update"),
    all("daily_logs", "delete"),
    all("time_entries", "read"),
    all("time_entries", "create"),
    all("time_entries", "update"),
    all("time_entries", "delete"),
    all("time_entries", "approve"),
    all("invoices", "read"),
    all("invoices", "create"),
    all("invoices", "update"),
    all("invoices", "delete"),
    all("invoices", "approve"),
    all("purchase_orders", "read"),
    all("purchase_orders", "create"),
    all("purchase_orders", "update"),
    all("purchase_orders", "delete"),
    all("purchase_orders", "approve"),
    all("documents", "read"),
    all("documents", "create"),
    all("documents", "update"),
    all("documents", "delete"),
    all("photos", "read"),
    all("photos", "create"),
    all("photos", "delete"),
    all("contacts", "read"),
    all("contacts", "create"),
    all("contacts", "update"),
    all("contacts", "delete"),
    all("reports", "read"),
    all("reports", "export"),
    all("users", "read"),
    all("users", "manage"),
    all("roles", "read"),
    all("roles", "manage"),
    all("settings", "read"),
    all("settings", "manage"),
    all("billing", "read"),
    all("billing", "manage"),
];

// Everything the owner has except billing.
const ADMIN: &[Permission] = &[
    all("jobs", "read"),
    all("jobs", "create"),
    all("jobs", "update"),
    all("jobs", "delete"),
    all("estimates", "read"),
    all("estimates", "create"),
    all("estimates", "update"),
    all("estimates", "delete"),
    all("budgets", "read"),
    all("budgets", "create"),
    all("budgets", "update"),
    all("budgets", "delete"),
    all("change_orders", "read"),
    all("change_orders", "create"),
    all("change_orders", "update"),
    all("change_orders", "delete"),
    all("change_orders", "approve"),
    all("schedules", "read"),
    all("schedules", "create"),
    all("schedules", "update"),
    all("schedules", "delete"),
    all("daily_logs", "read"),
    all("daily_logs", "create"),
    all("daily_logs", "update"),
    all("daily_logs", "delete"),
    all("time_entries", "read"),
    all("time_entries", "create"),
    all("time_entries", "update"),
    all("time_entries", "delete"),
    all("time_entries", "approve"),
    all("invoices", "read"),
    all("invoices", "create"),
    all("invoices", "update"),
    all("invoices", "delete"),
    all("invoices", "approve"),
    all("purchase_orders", "read"),
    all("purchase_orders", "create"),
    all("purchase_orders", "update"),
    all("purchase_orders", "delete"),
    all("purchase_orders", "approve"),
    all("documents", "read"),
    all("documents", "create"),
    all("documents", "update"),
    all("documents", "delete"),
    all("photos", "read"),
    all("photos", "create"),
    all("photos", "delete"),
    all("contacts", "read"),
    all("contacts", "create"),
    all("contacts", "update"),
    all("contacts", "delete"),
    all("reports", "read"),
    all("reports", "export"),
    all("users", "read"),
    all("users", "manage"),
    all("roles", "read"),
    all("roles", "manage"),
    all("settings", "read"),
    all("settings", "manage"),
];

const PM: &[Permission] = &[
    all("jobs", "read"),
    all("jobs", "create"),
    all("jobs", "update"),
    all("estimates", "read"),
    all("estimates", "create"),
    all("estimates", "update"),
    all("budgets", "read"),
    all("budgets", "create"),
    all("budgets", "update"),
    all("change_orders", "read"),
    all("change_orders", "create"),
    all("change_orders", "update"),
    all("change_orders", "approve"),
    all("schedules", "read"),
    all("schedules", "create"),
    all("schedules", "update"),
    all("schedules", "delete"),
    all("daily_logs", "read"),
    all("daily_logs", "create"),
    all("daily_logs", "update"),
    all("time_entries", "read"),
    all("time_entries", "approve"),
    own("time_entries", "create"),
    all("invoices", "read"),
    all("invoices", "create"),
    all("purchase_orders", "read"),
    all("purchase_orders", "create"),
    all("purchase_orders", "update"),
    all("purchase_orders", "approve"),
    all("documents", "read"),
    all("documents", "create"),
    all("documents", "update"),
    all("documents", "delete"),
    all("photos", "read"),
    all("photos", "create"),
    all("photos", "delete"),
    all("contacts", "read"),
    all("contacts", "create"),
    all("contacts", "update"),
    all("reports", "read"),
    all("reports", "export"),
    all("users", "read"),
];

const SUPERINTENDENT: &[Permission] = &[
    assigned("jobs", "read"),
    assigned("jobs", "update"),
    assigned("budgets", "read"),
    assigned("change_orders", "read"),
    assigned("change_orders", "create"),
    assigned("schedules", "read"),
    assigned("schedules", "update"),
    assigned("daily_logs", "read"),
    assigned("daily_logs", "create"),
    assigned("daily_logs", "update"),
    assigned("time_entries", "read"),
    assigned("time_entries", "approve"),
    own("time_entries", "create"),
    own("time_entries", "update"),
    assigned("purchase_orders", "read"),
    assigned("purchase_orders", "create"),
    assigned("documents", "read"),
    assigned("documents", "create"),
    assigned("photos", "read"),
    assigned("photos", "create"),
    all("contacts", "read"),
    assigned("reports", "read"),
];

const OFFICE: &[Permission] = &[
    all("jobs", "read"),
    all("jobs", "create"),
    all("jobs", "update"),
    all("estimates", "read"),
    all("estimates", "create"),
    all("estimates", "update"),
    all("budgets", "read"),
    all("change_orders", "read"),
    all("change_orders", "create"),
    all("schedules", "read"),
    all("daily_logs", "read"),
    all("time_entries", "read"),
    all("time_entries", "update"),
    all("invoices", "read"),
    all("invoices", "create"),
    all("invoices", "update"),
    all("invoices", "delete"),
    all("purchase_orders", "read"),
    all("purchase_orders", "create"),
    all("purchase_orders", "update"),
    all("documents", "read"),
    all("documents", "create"),
    all("documents", "update"),
    all("photos", "read"),
    all("contacts", "read"),
    all("contacts", "create"),
    all("contacts", "update"),
    all("contacts", "delete"),
    all("reports", "read"),
    all("reports", "export"),
];

const FIELD: &[Permission] = &[
    assigned("jobs", "read"),
    assigned("schedules", "read"),
    assigned("daily_logs", "read"),
    own("daily_logs", "create"),
    own("daily_logs", "update"),
    own("time_entries", "read"),
    own("time_entries", "create"),
    own("time_entries", "update"),
    assigned("documents", "read"),
    assigned("photos", "read"),
    own("photos", "create"),
    none("invoices", "read"),
];

const READ_ONLY: &[Permission] = &[
    assigned("jobs", "read"),
    assigned("schedules", "read"),
    assigned("daily_logs", "read"),
    assigned("documents", "read"),
    assigned("photos", "read"),
    assigned("reports", "read"),
];

static BUILTIN: PermissionCatalog =
    PermissionCatalog::new([OWNER, ADMIN, PM, SUPERINTENDENT, OFFICE, FIELD, READ_ONLY]);

/// Read-only mapping from canonical role to its default grants.
#[derive(Debug, Clone, Copy)]
pub struct PermissionCatalog {
    tables: [&'static [Permission]; 7],
}

impl PermissionCatalog {
    /// Tables are indexed in [`CanonicalRole::ALL`] order.
    pub const fn new(tables: [&'static [Permission]; 7]) -> Self {
        Self { tables }
    }

    /// The stock catalog shipped with the application.
    pub fn builtin() -> &'static PermissionCatalog {
        &BUILTIN
    }

    pub fn grants(&self, role: CanonicalRole) -> &'static [Permission] {
        self.tables[role.index()]
    }

    pub fn defaults(&self, role: CanonicalRole) -> PermissionSet {
        self.grants(role).iter().cloned().collect()
    }

    /// Defaults for whatever role an actor holds; unrecognized roles get nothing.
    pub fn defaults_for(&self, role: &RoleRef) -> PermissionSet {
        role.canonical()
            .map(|r| self.defaults(r))
            .unwrap_or_default()
    }

    /// Every canonical role with its defaults, highest privilege first.
    pub fn role_definitions(&self) -> Vec<RoleDefinition> {
        CanonicalRole::ALL
            .into_iter()
            .map(|role| RoleDefinition {
                role,
                level: role.level(),
                description: role_description(role),
                permissions: self.defaults(role).to_strings(),
            })
            .collect()
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        BUILTIN
    }
}

/// Stock role definition (for admin/audit display).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub role: CanonicalRole,
    pub level: u8,
    pub description: &'static str,
    pub permissions: Vec<String>,
}

fn role_description(role: CanonicalRole) -> &'static str {
    match role {
        CanonicalRole::Owner => "Company owner with full access, including billing",
        CanonicalRole::Admin => "Administrator with full operational access except billing",
        CanonicalRole::Pm => "Project manager running jobs, budgets and change orders",
        CanonicalRole::Superintendent => "Site lead for assigned jobs and crews",
        CanonicalRole::Office => "Office staff handling estimates, invoicing and purchasing",
        CanonicalRole::Field => "Field crew logging their own work on assigned jobs",
        CanonicalRole::ReadOnly => "View-only access to assigned jobs",
    }
}

/// Default grants of a canonical role in the stock catalog.
pub fn defaults(role: CanonicalRole) -> PermissionSet {
    PermissionCatalog::builtin().defaults(role)
}
