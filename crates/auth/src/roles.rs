//! Fixed role hierarchy.
//!
//! The seven canonical roles form a total order by privilege level. The table
//! is static; nothing here reads external input or changes at runtime.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use buildpro_core::RoleId;

/// Level assigned to a role name that is not one of the canonical roles.
///
/// Strictly below every canonical level, so `at_least` against any canonical
/// role is false.
pub const UNRECOGNIZED_LEVEL: u8 = 0;

/// One of the seven system roles, ordered highest to lowest privilege.
///
/// `Ord` is deliberately not derived: compare privilege with [`CanonicalRole::level`]
/// or [`CanonicalRole::at_least`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRole {
    Owner,
    Admin,
    Pm,
    Superintendent,
    Office,
    Field,
    ReadOnly,
}

impl CanonicalRole {
    /// All canonical roles, highest privilege first.
    pub const ALL: [CanonicalRole; 7] = [
        CanonicalRole::Owner,
        CanonicalRole::Admin,
        CanonicalRole::Pm,
        CanonicalRole::Superintendent,
        CanonicalRole::Office,
        CanonicalRole::Field,
        CanonicalRole::ReadOnly,
    ];

    /// Hierarchy level; higher means more privilege. Injective over the seven roles.
    pub const fn level(self) -> u8 {
        match self {
            CanonicalRole::Owner => 7,
            CanonicalRole::Admin => 6,
            CanonicalRole::Pm => 5,
            CanonicalRole::Superintendent => 4,
            CanonicalRole::Office => 3,
            CanonicalRole::Field => 2,
            CanonicalRole::ReadOnly => 1,
        }
    }

    /// `true` iff `self` ranks at or above `other`.
    pub const fn at_least(self, other: CanonicalRole) -> bool {
        self.level() >= other.level()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CanonicalRole::Owner => "owner",
            CanonicalRole::Admin => "admin",
            CanonicalRole::Pm => "pm",
            CanonicalRole::Superintendent => "superintendent",
            CanonicalRole::Office => "office",
            CanonicalRole::Field => "field",
            CanonicalRole::ReadOnly => "read_only",
        }
    }

    pub(crate) const fn index(self) -> usize {
        (7 - self.level()) as usize
    }
}

impl core::fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct RoleParseError(pub String);

impl FromStr for CanonicalRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}

/// The role an actor holds, as far as the decision core is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleRef {
    /// A stock system role.
    Canonical(CanonicalRole),
    /// A tenant-defined role; it ranks at its base role's level.
    Custom { id: RoleId, base: CanonicalRole },
    /// A role name the boundary could not map. Lowest level, no defaults.
    Unrecognized(String),
}

impl RoleRef {
    /// Map a stored role name, keeping unknown names as [`RoleRef::Unrecognized`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.parse::<CanonicalRole>() {
            Ok(role) => RoleRef::Canonical(role),
            Err(_) => {
                tracing::warn!(role = name, "unrecognized role name; treating as lowest level");
                RoleRef::Unrecognized(name.to_string())
            }
        }
    }

    /// The canonical role whose level and defaults apply, if any.
    pub fn canonical(&self) -> Option<CanonicalRole> {
        match self {
            RoleRef::Canonical(role) | RoleRef::Custom { base: role, .. } => Some(*role),
            RoleRef::Unrecognized(_) => None,
        }
    }

    pub fn level(&self) -> u8 {
        self.canonical()
            .map_or(UNRECOGNIZED_LEVEL, CanonicalRole::level)
    }

    pub fn at_least(&self, other: CanonicalRole) -> bool {
        self.level() >= other.level()
    }
}

impl From<CanonicalRole> for RoleRef {
    fn from(value: CanonicalRole) -> Self {
        RoleRef::Canonical(value)
    }
}

/// Hierarchy level of a canonical role.
pub const fn level(role: CanonicalRole) -> u8 {
    role.level()
}

/// `true` iff `a` ranks at or above `b`.
pub const fn at_least(a: CanonicalRole, b: CanonicalRole) -> bool {
    a.at_least(b)
}
