//! Human registrants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored human. Unique by email; created on first registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HumanRecord {
    /// Primary key.
    pub id: i64,
    /// Full name as submitted on the first registration form.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Time the human was first created.
    pub signed: DateTime<Utc>,
    /// The single role this human holds.
    pub role_id: i64,
}
