//! # eventum-api
//!
//! REST backend for event registration with role-based pricing and
//! per-role capacity limits.
//!
//! Humans register to events through a free-form JSON form. Each human
//! holds one role; each event may cap how many participants of a role it
//! takes. On every limit read the allocator recomputes how many
//! participants each limit absorbs, letting the catch-all role soak up
//! what the others could not hold and reporting the rest as overflow.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── EventService / LimitService / ParticipantRegistry (service/)
//!     ├── Allocator and records (domain/)
//!     │
//!     ├── RecordStore: PostgreSQL or in-memory (persistence/)
//!     └── Templates, descriptions, forms, membership list (documents/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod documents;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
