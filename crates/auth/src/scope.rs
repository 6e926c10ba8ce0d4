//! Scope evaluation against a concrete resource instance.
//!
//! Without a [`ResourceContext`] (list endpoints, counts) an `own`/`assigned`
//! grant cannot be confirmed here. The evaluator then answers
//! [`ScopeMatch::RequiresFilter`]: the actor may see *some* rows, and the
//! caller's query layer must narrow results with the returned [`RowFilter`].
//! Narrowing rows is never done by this crate.

use serde::{Deserialize, Serialize};

use buildpro_core::UserId;

use crate::permissions::Scope;

/// Ownership facts about the specific entity being accessed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    /// `None` for entities without an owner; such an entity never satisfies `own`.
    pub owner_id: Option<UserId>,
    pub assigned_ids: Vec<UserId>,
}

impl ResourceContext {
    pub fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            assigned_ids: Vec::new(),
        }
    }

    pub fn assigned_to(assigned_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            owner_id: None,
            assigned_ids: assigned_ids.into_iter().collect(),
        }
    }

    pub fn with_assignees(mut self, assigned_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.assigned_ids.extend(assigned_ids);
        self
    }

    pub fn is_owned_by(&self, actor_id: UserId) -> bool {
        self.owner_id == Some(actor_id)
    }

    pub fn is_assigned_to(&self, actor_id: UserId) -> bool {
        self.assigned_ids.contains(&actor_id)
    }
}

/// Row-level restriction the caller must apply when no instance was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum RowFilter {
    OwnedBy(UserId),
    AssignedTo(UserId),
}

/// Outcome of comparing one grant with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMatch {
    Granted,
    Denied,
    RequiresFilter(RowFilter),
}

impl ScopeMatch {
    /// `RequiresFilter` counts as permitted: the actor may access some subset.
    pub fn is_permitted(self) -> bool {
        !matches!(self, ScopeMatch::Denied)
    }
}

/// Compare a `granted` scope with a `requested` one for `actor_id`.
pub fn evaluate(
    granted: Scope,
    requested: Scope,
    context: Option<&ResourceContext>,
    actor_id: UserId,
) -> ScopeMatch {
    if !granted.covers(requested) {
        return ScopeMatch::Denied;
    }
    if granted == Scope::All {
        return ScopeMatch::Granted;
    }

    let (confirmed, filter) = match granted {
        Scope::Own => (
            context.map(|c| c.is_owned_by(actor_id)),
            RowFilter::OwnedBy(actor_id),
        ),
        Scope::Assigned => (
            context.map(|c| c.is_assigned_to(actor_id)),
            RowFilter::AssignedTo(actor_id),
        ),
        Scope::All | Scope::None => return ScopeMatch::Denied,
    };

    match confirmed {
        Some(true) => ScopeMatch::Granted,
        Some(false) => ScopeMatch::Denied,
        None => ScopeMatch::RequiresFilter(filter),
    }
}

/// Boolean form of [`evaluate`].
pub fn satisfies(
    granted: Scope,
    requested: Scope,
    context: Option<&ResourceContext>,
    actor_id: UserId,
) -> bool {
    evaluate(granted, requested, context, actor_id).is_permitted()
}
