//! Events and their read models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LimitView, ParticipantWithForm, PriceView};

/// A stored event row.
///
/// `template` and `description` hold paths into document storage, not
/// the documents themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Path of the registration form template (JSON).
    pub template: String,
    /// Last modification time.
    pub updated: DateTime<Utc>,
    /// Sign-up expiry date.
    pub expire: NaiveDate,
    /// Path of the free-text description, if one was written.
    pub description: Option<String>,
    /// Whether registration is open.
    pub available: bool,
}

impl EventRecord {
    /// Returns `true` once `today` is strictly more than `days` days past
    /// the sign-up expiry. At exactly `days` days the event is kept.
    #[must_use]
    pub fn purge_due(&self, today: NaiveDate, days: i64) -> bool {
        (today - self.expire).num_days() > days
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Registration form template.
    pub template: serde_json::Value,
    /// Sign-up expiry date.
    pub expire: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Whether registration opens immediately.
    pub available: bool,
}

/// Simplified event without template or description.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EventSummary {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Sign-up expiry date.
    pub expire: NaiveDate,
    /// Whether registration is open.
    pub available: bool,
    /// Last modification time.
    pub updated: DateTime<Utc>,
}

impl From<&EventRecord> for EventSummary {
    fn from(record: &EventRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            expire: record.expire,
            available: record.available,
            updated: record.updated,
        }
    }
}

/// Full event with documents, limits, prices and optionally participants.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDetail {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Sign-up expiry date.
    pub expire: NaiveDate,
    /// Whether registration is open.
    pub available: bool,
    /// Last modification time.
    pub updated: DateTime<Utc>,
    /// Registration form template.
    #[schema(value_type = Object)]
    pub template: serde_json::Value,
    /// Free-text description (empty when none was written).
    pub description: String,
    /// Capacity limits after allocation.
    pub limits: Vec<LimitView>,
    /// Prices per role.
    pub prices: Vec<PriceView>,
    /// Participants with forms, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<ParticipantWithForm>>,
}
