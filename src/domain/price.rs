//! Prices per (event, role).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Role;

/// A stored price row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Primary key.
    pub id: i64,
    /// Owning event.
    pub event_id: i64,
    /// Role the price applies to.
    pub role_id: i64,
    /// Monetary amount.
    pub price: f64,
}

/// Price with its role resolved.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PriceView {
    /// Primary key.
    pub id: i64,
    /// Resolved role, if it still exists.
    pub role: Option<Role>,
    /// Monetary amount.
    pub price: f64,
}
