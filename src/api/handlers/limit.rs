//! Limit handlers: allocation listing, lookups, create, update.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateLimitRequest, LimitListResponse, LimitResponse, UpdateLimitRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, EventumError};

/// `GET /events/{id}/limits`: run the allocator and list limits.
///
/// # Errors
///
/// Returns [`EventumError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/limits",
    tag = "Limits",
    summary = "List limits with fill counts",
    description = "Recomputes how many participants each role limit absorbs, stores the fill counts and returns the limits. Participants that fit nowhere are reported in a trailing `overflow` entry without id.",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Limits after allocation", body = LimitListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_limits(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, EventumError> {
    state.events.event_summary(id).await?;
    let limits = state.limits.get_limits(id).await?;
    Ok(Json(LimitListResponse { limits }))
}

/// `POST /events/{id}/limits`: create a limit.
///
/// # Errors
///
/// Returns [`EventumError`] if the event or role is unknown or the limit
/// already exists.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/limits",
    tag = "Limits",
    summary = "Create a limit",
    description = "Creates a capacity limit for one role, or an event-wide limit when `role_id` is omitted. Each (event, role) pair holds at most one limit.",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    request_body = CreateLimitRequest,
    responses(
        (status = 201, description = "Limit created", body = LimitResponse),
        (status = 404, description = "Event or role not found", body = ErrorResponse),
        (status = 409, description = "Limit already exists", body = ErrorResponse),
    )
)]
pub async fn create_limit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateLimitRequest>,
) -> Result<impl IntoResponse, EventumError> {
    let limit = state.limits.create_limit(id, req.size, req.role_id).await?;
    Ok((StatusCode::CREATED, Json(LimitResponse { limit })))
}

/// `GET /events/{id}/roles/{role_id}/limit`: limit of one role.
///
/// # Errors
///
/// Returns [`EventumError::LimitNotFound`] if the pair has no limit.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/roles/{role_id}/limit",
    tag = "Limits",
    summary = "Get the limit of a role",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("role_id" = i64, Path, description = "Role id"),
    ),
    responses(
        (status = 200, description = "Limit", body = LimitResponse),
        (status = 404, description = "Limit not found", body = ErrorResponse),
    )
)]
pub async fn get_role_limit(
    State(state): State<AppState>,
    Path((id, role_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, EventumError> {
    let limit = state.limits.get_limit_for_role(id, role_id).await?;
    Ok(Json(LimitResponse { limit }))
}

/// `PUT /events/{id}/roles/{role_id}/limit`: resize a role's limit.
///
/// # Errors
///
/// Returns [`EventumError::LimitNotFound`] if the pair has no limit.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}/roles/{role_id}/limit",
    tag = "Limits",
    summary = "Resize the limit of a role",
    description = "Changes the capacity. Fill counts follow on the next allocation.",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("role_id" = i64, Path, description = "Role id"),
    ),
    request_body = UpdateLimitRequest,
    responses(
        (status = 200, description = "Updated limit", body = LimitResponse),
        (status = 404, description = "Limit not found", body = ErrorResponse),
    )
)]
pub async fn update_role_limit(
    State(state): State<AppState>,
    Path((id, role_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateLimitRequest>,
) -> Result<impl IntoResponse, EventumError> {
    let limit = state.limits.update_limit(id, role_id, req.size).await?;
    Ok(Json(LimitResponse { limit }))
}

/// `GET /limits/{id}`: a single limit.
///
/// # Errors
///
/// Returns [`EventumError::LimitNotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/api/v1/limits/{id}",
    tag = "Limits",
    summary = "Get a limit",
    params(
        ("id" = i64, Path, description = "Limit id"),
    ),
    responses(
        (status = 200, description = "Limit", body = LimitResponse),
        (status = 404, description = "Limit not found", body = ErrorResponse),
    )
)]
pub async fn get_limit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, EventumError> {
    let limit = state.limits.get_limit(id).await?;
    Ok(Json(LimitResponse { limit }))
}

/// Limit routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/limits", get(list_limits).post(create_limit))
        .route(
            "/events/{id}/roles/{role_id}/limit",
            get(get_role_limit).put(update_role_limit),
        )
        .route("/limits/{id}", get(get_limit))
}
