//! Limit DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{LimitDetail, LimitView};

/// Request body for `POST /events/{id}/limits`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLimitRequest {
    /// Capacity.
    pub size: u32,
    /// Role the limit applies to; omit for an event-wide limit.
    #[serde(default)]
    pub role_id: Option<i64>,
}

/// Request body for `PUT /events/{id}/roles/{role_id}/limit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLimitRequest {
    /// New capacity.
    pub size: u32,
}

/// Response body for `GET /events/{id}/limits`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LimitListResponse {
    /// Limits after allocation, with the overflow entry last if present.
    pub limits: Vec<LimitView>,
}

/// Response body for single-limit operations.
#[derive(Debug, Serialize, ToSchema)]
pub struct LimitResponse {
    /// The limit with event and role resolved.
    pub limit: LimitDetail,
}
