//! Event DTOs for create, list and detail operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{EventDetail, EventSummary, NewEvent};

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Display name.
    pub name: String,
    /// Registration form template.
    #[schema(value_type = Object)]
    pub template: serde_json::Value,
    /// Sign-up expiry date (`YYYY-MM-DD`).
    pub expire: NaiveDate,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether registration opens immediately.
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            name: req.name,
            template: req.template,
            expire: req.expire,
            description: req.description.unwrap_or_default(),
            available: req.available,
        }
    }
}

/// Query parameters for `GET /events/{id}`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventQuery {
    /// Attach participants and their forms.
    #[serde(default)]
    pub participants: bool,
}

/// Response body for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Every event, simplified.
    pub events: Vec<EventSummary>,
}

/// Response body for single-event operations.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    /// Full event detail.
    pub event: EventDetail,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let raw = r#"{"name": "Gala", "template": {}, "expire": "2026-11-01"}"#;
        let Ok(req) = serde_json::from_str::<CreateEventRequest>(raw) else {
            panic!("request rejected");
        };
        assert!(req.available);
        let new = NewEvent::from(req);
        assert_eq!(new.description, "");
    }

    #[test]
    fn create_request_rejects_bad_date() {
        let raw = r#"{"name": "Gala", "template": {}, "expire": "next week"}"#;
        assert!(serde_json::from_str::<CreateEventRequest>(raw).is_err());
    }
}
