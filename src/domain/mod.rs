//! Domain layer: records, read models, and the capacity allocator.
//!
//! Record types mirror the stored columns one-to-one and are decoded
//! straight from the record store. View types are what the API returns
//! after foreign keys have been resolved.

pub mod allocation;
pub mod event;
pub mod human;
pub mod limit;
pub mod participant;
pub mod price;
pub mod role;

pub use allocation::{Allocation, LimitFill, allocate};
pub use event::{EventDetail, EventRecord, EventSummary, NewEvent};
pub use human::HumanRecord;
pub use limit::{LimitDetail, LimitRecord, LimitView, RoleRef};
pub use participant::{Participant, ParticipantWithForm, ParticipationRecord, Registration};
pub use price::{PriceRecord, PriceView};
pub use role::{RESERVED_ROLES, Role, RolePower};
