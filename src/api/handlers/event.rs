//! Event handlers: create, list, get.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateEventRequest, EventListResponse, EventQuery, EventResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, EventumError};

/// `POST /events`: create an event.
///
/// # Errors
///
/// Returns [`EventumError`] on an invalid request or a storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Stores the form template and description and creates the event record.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, EventumError> {
    let event = state.events.create_event(req.into()).await?;
    Ok((StatusCode::CREATED, Json(EventResponse { event })))
}

/// `GET /events`: list every event.
///
/// # Errors
///
/// Returns [`EventumError`] on a storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns every event without template or description. Participations of events past the retention window are purged first.",
    responses(
        (status = 200, description = "Event list", body = EventListResponse),
    )
)]
pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, EventumError> {
    let events = state.events.list_events().await?;
    Ok(Json(EventListResponse { events }))
}

/// `GET /events/{id}`: event detail.
///
/// # Errors
///
/// Returns [`EventumError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event details",
    description = "Returns template, description, limits after allocation and prices. With `participants=true` the participants and their forms are attached.",
    params(
        ("id" = i64, Path, description = "Event id"),
        EventQuery,
    ),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, EventumError> {
    let event = state.events.get_event(id, query.participants).await?;
    Ok(Json(EventResponse { event }))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
}
