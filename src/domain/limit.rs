//! Capacity limits and their read models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EventSummary, Role};

/// Role name used for the synthetic entry that reports unabsorbed
/// overflow.
pub const OVERFLOW_ROLE_NAME: &str = "overflow";

/// A stored limit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRecord {
    /// Primary key.
    pub id: i64,
    /// Owning event.
    pub event_id: i64,
    /// Role the limit applies to; `None` means event-wide.
    pub role_id: Option<i64>,
    /// Configured capacity.
    pub size: u32,
    /// Participants counted against this limit by the last allocation.
    pub filled: u32,
}

/// Role as embedded in a limit view.
///
/// The synthetic overflow entry only carries a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleRef {
    /// Role primary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Role name.
    pub name: String,
    /// Role power.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<i32>,
}

impl From<&Role> for RoleRef {
    fn from(role: &Role) -> Self {
        Self {
            id: Some(role.id),
            name: role.name.clone(),
            power: Some(role.power.get()),
        }
    }
}

/// One entry of an event's limit listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LimitView {
    /// Limit primary key; absent on the synthetic overflow entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Resolved role; `null` for event-wide limits.
    pub role: Option<RoleRef>,
    /// Configured capacity.
    pub size: u32,
    /// Participants counted against this limit.
    pub filled: u32,
}

impl LimitView {
    /// Builds the non-persisted entry reporting `count` participants that
    /// no limit could absorb.
    #[must_use]
    pub fn overflow(count: u32) -> Self {
        Self {
            id: None,
            role: Some(RoleRef {
                id: None,
                name: OVERFLOW_ROLE_NAME.to_string(),
                power: None,
            }),
            size: count,
            filled: count,
        }
    }

    /// Returns `true` for the synthetic overflow entry.
    #[must_use]
    pub fn is_overflow(&self) -> bool {
        self.id.is_none()
            && self
                .role
                .as_ref()
                .is_some_and(|role| role.name == OVERFLOW_ROLE_NAME)
    }
}

/// A single limit with its event and role resolved.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LimitDetail {
    /// Primary key.
    pub id: i64,
    /// Owning event, simplified.
    pub event: EventSummary,
    /// Resolved role; `null` for event-wide limits.
    pub role: Option<Role>,
    /// Configured capacity.
    pub size: u32,
    /// Participants counted against this limit.
    pub filled: u32,
}
