//! Service error types with HTTP status code mapping.
//!
//! [`EventumError`] is the central error type for the service layer and
//! the REST handlers. Each variant maps to a specific HTTP status code and
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::documents::DocumentError;
use crate::persistence::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "event not found: 42"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`EventumError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request              |
/// | 2000–2099 | Not Found         | 404 Not Found                |
/// | 2100–2199 | Conflict          | 409 Conflict                 |
/// | 3000–3999 | Server            | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum EventumError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Event with the given id was not found.
    #[error("event not found: {0}")]
    EventNotFound(i64),

    /// Limit was not found.
    #[error("limit not found: {0}")]
    LimitNotFound(String),

    /// Role with the given id was not found.
    #[error("role not found: {0}")]
    RoleNotFound(i64),

    /// Participation with the given id was not found.
    #[error("participation not found: {0}")]
    ParticipationNotFound(i64),

    /// The human already participates in the event.
    #[error("{email} is already registered to event {event_id}")]
    AlreadyRegistered {
        /// Event registered to.
        event_id: i64,
        /// Email of the registrant.
        email: String,
    },

    /// A limit already exists for this (event, role) pair.
    #[error("event {event_id} already has a limit for {role}")]
    DuplicateLimit {
        /// Owning event.
        event_id: i64,
        /// Role description (`role <id>` or `all roles`).
        role: String,
    },

    /// No role with the required power exists.
    #[error("no role with power {0} is configured")]
    MissingRole(i32),

    /// Record store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Document storage failure.
    #[error("document error: {0}")]
    Documents(#[from] DocumentError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EventumError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::EventNotFound(_) => 2001,
            Self::LimitNotFound(_) => 2002,
            Self::RoleNotFound(_) => 2003,
            Self::ParticipationNotFound(_) => 2004,
            Self::AlreadyRegistered { .. } => 2101,
            Self::DuplicateLimit { .. } => 2102,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::Documents(_) => 3002,
            Self::MissingRole(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_)
            | Self::LimitNotFound(_)
            | Self::RoleNotFound(_)
            | Self::ParticipationNotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered { .. } | Self::DuplicateLimit { .. } => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Documents(_) | Self::MissingRole(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EventumError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            EventumError::EventNotFound(1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EventumError::LimitNotFound("id 3".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflicts_map_to_409() {
        let err = EventumError::DuplicateLimit {
            event_id: 1,
            role: "role 2".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2102);
        assert_eq!(err.to_string(), "event 1 already has a limit for role 2");
    }

    #[test]
    fn storage_errors_are_server_errors() {
        let err = EventumError::from(StoreError::Database("connection reset".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), 3001);
    }

    #[test]
    fn response_carries_status() {
        let response = EventumError::InvalidRequest("missing email".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
