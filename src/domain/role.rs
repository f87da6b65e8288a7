//! Roles and their reserved powers.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Integer rank of a role.
///
/// Two values carry meaning for the service: [`RolePower::FALLBACK`] marks
/// the catch-all role that absorbs overflow from every other role, and
/// [`RolePower::MEMBER`] is the role given to humans found in the
/// membership list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RolePower(i32);

impl RolePower {
    /// The "other" role that absorbs overflow.
    pub const FALLBACK: Self = Self(1);

    /// Default role for verified members.
    pub const MEMBER: Self = Self(3);

    /// Wraps a raw power value.
    #[must_use]
    pub const fn new(power: i32) -> Self {
        Self(power)
    }

    /// Returns the raw power value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns `true` for the overflow-absorbing role.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        self.0 == Self::FALLBACK.0
    }
}

/// Roles every deployment must carry, by name and power.
pub const RESERVED_ROLES: [(&str, RolePower); 2] =
    [("other", RolePower::FALLBACK), ("member", RolePower::MEMBER)];

impl fmt::Display for RolePower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A role shared by all events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Rank; see [`RolePower`].
    pub power: RolePower,
}
