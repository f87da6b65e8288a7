//! Participations and the resolved participant view.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RolePower;

/// A stored participation: one human registered to one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParticipationRecord {
    /// Primary key.
    pub id: i64,
    /// Event registered to.
    pub event_id: i64,
    /// Registered human.
    pub human_id: i64,
    /// Path of the submitted form in document storage.
    pub form: String,
    /// Paid amount; anything above zero counts as paid.
    pub paid: i32,
}

impl ParticipationRecord {
    /// Returns `true` if a payment was recorded.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.paid > 0
    }
}

/// A participant of an event with human and role resolved.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Participant {
    /// Participation primary key; defines the registry order.
    pub participation_id: i64,
    /// Human primary key.
    pub human_id: i64,
    /// Human name.
    pub name: String,
    /// Human email.
    pub email: String,
    /// Role held by the human.
    pub role_id: i64,
    /// Power of that role.
    pub role_power: RolePower,
    /// Paid amount.
    pub paid: i32,
}

/// A participant together with the submitted form.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ParticipantWithForm {
    /// Resolved participant.
    #[serde(flatten)]
    pub participant: Participant,
    /// Submitted form; `null` if the document could not be read.
    #[schema(value_type = Object)]
    pub form: serde_json::Value,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Registration {
    /// Participation primary key.
    pub id: i64,
    /// Event registered to.
    pub event_id: i64,
    /// Registered human.
    pub human_id: i64,
    /// Paid amount (always zero on creation).
    pub paid: i32,
    /// The submitted form as stored.
    #[schema(value_type = Object)]
    pub form: serde_json::Value,
}
