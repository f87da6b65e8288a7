//! Participant DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ParticipantWithForm, ParticipationRecord, Registration};

/// Request body for `POST /events/{id}/participants`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Filled-in registration form; must carry `name` and `email`.
    #[schema(value_type = Object)]
    pub form: serde_json::Value,
}

/// Response body for `POST /events/{id}/participants` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    /// The new participation.
    pub participant: Registration,
}

/// Response body for `POST /participations/{id}/payment/{status}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    /// The updated participation.
    pub participant: ParticipationRecord,
}

/// Response body for `GET /events/{id}/participants`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantListResponse {
    /// Participants in registration order, with forms.
    pub participants: Vec<ParticipantWithForm>,
}
