//! Service layer: business logic orchestration.
//!
//! [`EventService`] owns the event lifecycle, [`LimitService`] runs the
//! capacity allocator, and [`ParticipantRegistry`] resolves and mutates
//! participations. All three share one [`crate::persistence::RecordStore`].

pub mod catalog;
pub mod event_service;
pub mod limit_service;
pub mod participant_registry;

#[cfg(test)]
pub(crate) mod testing;

pub use event_service::EventService;
pub use limit_service::LimitService;
pub use participant_registry::ParticipantRegistry;
