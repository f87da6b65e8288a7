//! Data Transfer Objects for REST request/response serialization.
//!
//! Responses wrap their payload in a single named field (`{"event": ..}`,
//! `{"limits": [..]}`) so clients can tell resources apart at a glance.

pub mod event_dto;
pub mod limit_dto;
pub mod participant_dto;

pub use event_dto::*;
pub use limit_dto::*;
pub use participant_dto::*;
