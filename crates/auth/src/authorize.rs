//! The authorization decision: one fail-closed boolean per request.
//!
//! - No IO
//! - No panics
//! - No shared mutable state (safe to call from any number of threads)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use buildpro_core::UserId;

use crate::catalog::PermissionCatalog;
use crate::custom_role::{CustomRole, CustomRoleResolver};
use crate::permissions::{Permission, PermissionSet, Scope, is_identifier};
use crate::roles::{CanonicalRole, RoleRef};
use crate::scope::{self, ResourceContext, RowFilter, ScopeMatch};

/// Tenant-wide governance mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyMode {
    /// Coarse mode for tenants without granular roles: everything is allowed
    /// except the restricted resources, which need the owner.
    Open,
    /// Every request is checked against the actor's permission set.
    #[default]
    Standard,
}

/// Resource that requires the owner role in [`CompanyMode::Open`] regardless of
/// configuration.
pub const OWNER_ONLY_RESOURCE: &str = "billing";

/// Engine settings. The defaults reproduce the stock behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Additional resources that require the owner role in [`CompanyMode::Open`].
    /// Can only add to [`OWNER_ONLY_RESOURCE`], never remove it.
    pub open_mode_restricted: BTreeSet<String>,
}

impl EngineConfig {
    pub fn is_owner_only(&self, resource: &str) -> bool {
        resource == OWNER_ONLY_RESOURCE || self.open_mode_restricted.contains(resource)
    }
}

/// The identity making a request, with its permission set resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: RoleRef,
    pub permissions: PermissionSet,
}

impl Actor {
    pub fn new(id: UserId, role: RoleRef, permissions: PermissionSet) -> Self {
        Self { id, role, permissions }
    }

    /// An actor holding a stock role with its catalog defaults.
    pub fn canonical(id: UserId, role: CanonicalRole, catalog: &PermissionCatalog) -> Self {
        Self::new(id, RoleRef::Canonical(role), catalog.defaults(role))
    }

    /// An actor holding a stored role record (system or tenant-defined).
    pub fn with_role(id: UserId, role: &CustomRole, resolver: &CustomRoleResolver<'_>) -> Self {
        Self::new(id, role.role_ref(), resolver.resolve_role(role))
    }
}

/// What is being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest<'a> {
    pub resource: &'a str,
    pub action: &'a str,
    pub scope: Scope,
    pub context: Option<&'a ResourceContext>,
}

impl<'a> AccessRequest<'a> {
    pub fn new(resource: &'a str, action: &'a str, scope: Scope) -> Self {
        Self {
            resource,
            action,
            scope,
            context: None,
        }
    }

    /// Check against one specific entity instead of "some subset".
    pub fn on(mut self, context: &'a ResourceContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Open mode, unrestricted resource.
    OpenMode,
    /// Open mode, restricted resource, actor is the owner.
    OpenModeOwner,
    /// Open mode, restricted resource, actor is not the owner.
    OpenModeRestricted,
    /// A grant covers the request (and ownership, where relevant).
    ScopeGranted,
    /// An `own`/`assigned` grant applies but no instance was supplied.
    RequiresRowFilter,
    /// Grants exist for the resource/action, but none is broad enough.
    ScopeInsufficient,
    /// A narrow grant covers the scope, but the entity is not the actor's.
    OwnershipMismatch,
    /// No grant for this resource/action at all.
    NoMatchingGrant,
    /// The actor's role could not be mapped to a canonical role.
    UnrecognizedRole,
    /// Resource or action is not a valid identifier.
    MalformedRequest,
}

/// Auditable decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub granted: bool,
    pub reason: DecisionReason,
    /// The grant that allowed the request, in standard mode.
    pub matched: Option<Permission>,
    /// Row narrowing the caller must apply before returning data.
    pub row_filter: Option<RowFilter>,
}

impl Decision {
    fn deny(reason: DecisionReason) -> Self {
        Self {
            granted: false,
            reason,
            matched: None,
            row_filter: None,
        }
    }

    fn allow(reason: DecisionReason) -> Self {
        Self {
            granted: true,
            reason,
            matched: None,
            row_filter: None,
        }
    }
}

/// Combines the role hierarchy, the actor's grants, and the tenant mode.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationEngine {
    config: EngineConfig,
}

impl AuthorizationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn has_permission(
        &self,
        actor: &Actor,
        request: &AccessRequest<'_>,
        mode: CompanyMode,
    ) -> bool {
        self.explain(actor, request, mode).granted
    }

    /// Decide and say why.
    pub fn explain(
        &self,
        actor: &Actor,
        request: &AccessRequest<'_>,
        mode: CompanyMode,
    ) -> Decision {
        let decision = self.decide(actor, request, mode);
        tracing::debug!(
            actor = %actor.id,
            resource = request.resource,
            action = request.action,
            scope = %request.scope,
            mode = ?mode,
            granted = decision.granted,
            reason = ?decision.reason,
            "authorization decision"
        );
        decision
    }

    fn decide(&self, actor: &Actor, request: &AccessRequest<'_>, mode: CompanyMode) -> Decision {
        if !is_identifier(request.resource) || !is_identifier(request.action) {
            return Decision::deny(DecisionReason::MalformedRequest);
        }
        if actor.role.canonical().is_none() {
            return Decision::deny(DecisionReason::UnrecognizedRole);
        }

        match mode {
            CompanyMode::Open => self.decide_open(actor, request),
            CompanyMode::Standard => decide_standard(actor, request),
        }
    }

    fn decide_open(&self, actor: &Actor, request: &AccessRequest<'_>) -> Decision {
        if !self.config.is_owner_only(request.resource) {
            return Decision::allow(DecisionReason::OpenMode);
        }
        if actor.role.at_least(CanonicalRole::Owner) {
            Decision::allow(DecisionReason::OpenModeOwner)
        } else {
            Decision::deny(DecisionReason::OpenModeRestricted)
        }
    }
}

fn decide_standard(actor: &Actor, request: &AccessRequest<'_>) -> Decision {
    let mut filtered: Option<(&Permission, RowFilter)> = None;
    let mut any_grant = false;
    let mut ownership_failed = false;

    for grant in actor.permissions.grants_for(request.resource, request.action) {
        any_grant = true;
        match scope::evaluate(grant.scope(), request.scope, request.context, actor.id) {
            ScopeMatch::Granted => {
                return Decision {
                    granted: true,
                    reason: DecisionReason::ScopeGranted,
                    matched: Some(grant.clone()),
                    row_filter: None,
                };
            }
            ScopeMatch::RequiresFilter(filter) => {
                if filtered.is_none() {
                    filtered = Some((grant, filter));
                }
            }
            ScopeMatch::Denied => {
                ownership_failed |= grant.scope().covers(request.scope);
            }
        }
    }

    if let Some((grant, filter)) = filtered {
        return Decision {
            granted: true,
            reason: DecisionReason::RequiresRowFilter,
            matched: Some(grant.clone()),
            row_filter: Some(filter),
        };
    }

    Decision::deny(if ownership_failed {
        DecisionReason::OwnershipMismatch
    } else if any_grant {
        DecisionReason::ScopeInsufficient
    } else {
        DecisionReason::NoMatchingGrant
    })
}

/// Decide with the stock engine configuration.
pub fn has_permission(actor: &Actor, request: &AccessRequest<'_>, mode: CompanyMode) -> bool {
    AuthorizationEngine::default().has_permission(actor, request, mode)
}
