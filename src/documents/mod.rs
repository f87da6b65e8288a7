//! File-backed documents owned by events and participations.
//!
//! Templates, descriptions and submitted forms live on disk; the record
//! store only keeps their paths. The membership list used to classify new
//! registrants is read from the same kind of storage.

pub mod membership;
pub mod store;

pub use membership::MemberList;
pub use store::{DocumentError, DocumentStore};
