//! Participant handlers: list, register, payment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ParticipantListResponse, PaymentResponse, RegisterRequest, RegistrationResponse,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, EventumError};

/// `GET /events/{id}/participants`: participants with forms.
///
/// # Errors
///
/// Returns [`EventumError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/participants",
    tag = "Participants",
    summary = "List participants",
    description = "Returns the participants of an event in registration order, each with its submitted form.",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Participants", body = ParticipantListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, EventumError> {
    state.events.event_summary(id).await?;
    let participants = state.participants.list_participants_with_forms(id).await?;
    Ok(Json(ParticipantListResponse { participants }))
}

/// `POST /events/{id}/participants`: register to an event.
///
/// # Errors
///
/// Returns [`EventumError`] if the form is incomplete, the event does not
/// exist, or the registrant is already registered.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/participants",
    tag = "Participants",
    summary = "Register to an event",
    description = "Creates the registrant on first sign-up (member role if listed in the membership list) and stores the submitted form.",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Form lacks name or email", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Already registered", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, EventumError> {
    let participant = state.participants.register(id, req.form).await?;
    Ok((StatusCode::CREATED, Json(RegistrationResponse { participant })))
}

/// `POST /participations/{id}/payment/{status}`: record a payment.
///
/// # Errors
///
/// Returns [`EventumError::ParticipationNotFound`] for an unknown id.
#[utoipa::path(
    post,
    path = "/api/v1/participations/{id}/payment/{status}",
    tag = "Participants",
    summary = "Set payment status",
    description = "Overwrites the paid amount of a participation. Any value above zero counts as paid.",
    params(
        ("id" = i64, Path, description = "Participation id"),
        ("status" = i32, Path, description = "Paid amount"),
    ),
    responses(
        (status = 200, description = "Updated participation", body = PaymentResponse),
        (status = 404, description = "Participation not found", body = ErrorResponse),
    )
)]
pub async fn set_payment(
    State(state): State<AppState>,
    Path((id, status)): Path<(i64, i32)>,
) -> Result<impl IntoResponse, EventumError> {
    let participant = state.participants.set_payment(id, status).await?;
    Ok(Json(PaymentResponse { participant }))
}

/// Participant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/participants", get(list_participants).post(register))
        .route("/participations/{id}/payment/{status}", post(set_payment))
}
