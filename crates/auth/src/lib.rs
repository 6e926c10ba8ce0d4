//! `buildpro-auth` — the authorization decision core.
//!
//! Pure and synchronous: callers resolve an actor's permission set once, then
//! ask [`AuthorizationEngine`] per request. This crate is intentionally
//! decoupled from HTTP, storage and authentication.

pub mod authorize;
pub mod catalog;
pub mod custom_role;
pub mod permissions;
pub mod roles;
pub mod scope;

pub use authorize::{
    AccessRequest, Actor, AuthorizationEngine, CompanyMode, Decision, DecisionReason,
    EngineConfig, OWNER_ONLY_RESOURCE, has_permission,
};
pub use catalog::{PermissionCatalog, RoleDefinition, defaults};
pub use custom_role::{CustomRole, CustomRoleResolver, RoleDelta, resolve};
pub use permissions::{Permission, PermissionParseError, PermissionSet, Scope};
pub use roles::{CanonicalRole, RoleParseError, RoleRef, at_least, level};
pub use scope::{ResourceContext, RowFilter, ScopeMatch};
