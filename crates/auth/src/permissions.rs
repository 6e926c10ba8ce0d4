//! Structured permissions and their `resource:action:scope` wire form.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use buildpro_core::DomainError;

/// Breadth of a grant.
///
/// `Scope` is partially ordered by dominance: `All` dominates every scope,
/// `Own` and `Assigned` each dominate `None`, and `Own`/`Assigned` are not
/// comparable to each other. A `None` *grant* never satisfies anything; see
/// [`Scope::covers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Own,
    Assigned,
    None,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::All, Scope::Own, Scope::Assigned, Scope::None];

    pub const fn as_str(self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Own => "own",
            Scope::Assigned => "assigned",
            Scope::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Scope::ALL.into_iter().find(|scope| scope.as_str() == s)
    }

    /// Whether a grant at this scope reaches `requested`, ignoring ownership.
    pub fn covers(self, requested: Scope) -> bool {
        self != Scope::None && self >= requested
    }

    const fn rank(self) -> u8 {
        match self {
            Scope::All => 2,
            Scope::Own | Scope::Assigned => 1,
            Scope::None => 0,
        }
    }
}

impl PartialOrd for Scope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            _ if self == other => Some(Ordering::Equal),
            (Scope::Own, Scope::Assigned) | (Scope::Assigned, Scope::Own) => None,
            _ => Some(self.rank().cmp(&other.rank())),
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionParseError {
    #[error("permission string is empty")]
    Empty,

    #[error("permission '{0}' must have exactly three ':'-separated segments")]
    SegmentCount(String),

    #[error("invalid identifier '{0}' (expected lowercase letters and underscores)")]
    InvalidIdentifier(String),

    #[error("unknown scope '{0}'")]
    UnknownScope(String),
}

impl From<PermissionParseError> for DomainError {
    fn from(value: PermissionParseError) -> Self {
        DomainError::validation(value.to_string())
    }
}

/// `[a-z][a-z_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c == '_')
}

fn identifier(s: &str) -> Result<&str, PermissionParseError> {
    if is_identifier(s) {
        Ok(s)
    } else {
        Err(PermissionParseError::InvalidIdentifier(s.to_string()))
    }
}

/// A grant to perform `action` on `resource` up to `scope`.
///
/// Serialized as `resource:action:scope`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    resource: Cow<'static, str>,
    action: Cow<'static, str>,
    scope: Scope,
}

impl Permission {
    pub fn new(
        resource: impl Into<String>,
        action: impl Into<String>,
        scope: Scope,
    ) -> Result<Self, PermissionParseError> {
        let resource = resource.into();
        let action = action.into();
        identifier(&resource)?;
        identifier(&action)?;
        Ok(Self {
            resource: Cow::Owned(resource),
            action: Cow::Owned(action),
            scope,
        })
    }

    /// Compile-time grant for built-in tables. Identifiers are checked by the
    /// catalog tests rather than at construction.
    pub const fn from_static(resource: &'static str, action: &'static str, scope: Scope) -> Self {
        Self {
            resource: Cow::Borrowed(resource),
            action: Cow::Borrowed(action),
            scope,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether this grant is for `resource:action`, at any scope.
    pub fn applies_to(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

impl Ord for Permission {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.resource(), self.action(), self.scope.as_str()).cmp(&(
            other.resource(),
            other.action(),
            other.scope.as_str(),
        ))
    }
}

impl PartialOrd for Permission {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.action, self.scope)
    }
}

impl core::str::FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PermissionParseError::Empty);
        }
        let mut parts = s.split(':');
        let (Some(resource), Some(action), Some(scope), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(PermissionParseError::SegmentCount(s.to_string()));
        };
        let scope = Scope::parse(scope)
            .ok_or_else(|| PermissionParseError::UnknownScope(scope.to_string()))?;
        Permission::new(resource, action, scope)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

fn parse_lenient(raw: &str) -> Option<Permission> {
    match raw.parse::<Permission>() {
        Ok(p) => Some(p),
        Err(err) => {
            tracing::warn!(permission = raw, error = %err, "ignoring malformed permission");
            None
        }
    }
}

/// `deserialize_with` helper for stored permission lists: malformed entries
/// are logged and dropped instead of failing the whole record.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Vec<Permission>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|s| parse_lenient(s)).collect())
}

/// A set of grants, ordered for stable display and comparison.
///
/// Several grants for the same `resource:action` at different scopes may
/// coexist; decisions consider every one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from stored strings, dropping any that fail to parse.
    pub fn from_strings_lenient<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .filter_map(|s| parse_lenient(s.as_ref()))
            .collect()
    }

    /// Build a set from strings, failing on the first malformed entry.
    pub fn try_from_strings<I, S>(raw: I) -> Result<Self, PermissionParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|s| s.as_ref().parse::<Permission>())
            .collect()
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.0.remove(permission)
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    /// Membership test against the wire form. Malformed strings are never members.
    pub fn contains_str(&self, permission: &str) -> bool {
        permission
            .parse::<Permission>()
            .is_ok_and(|p| self.contains(&p))
    }

    /// Every grant for `resource:action`, at any scope.
    pub fn grants_for<'a>(
        &'a self,
        resource: &'a str,
        action: &'a str,
    ) -> impl Iterator<Item = &'a Permission> + 'a {
        self.0.iter().filter(move |p| p.applies_to(resource, action))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted wire-form strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(Permission::to_string).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<T: IntoIterator<Item = Permission>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::collections::btree_set::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::btree_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
