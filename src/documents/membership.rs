//! Membership list lookup.
//!
//! The list is a JSON array of objects exported from an external member
//! registry. Field names vary between exports, so an email counts as a
//! member when any value of any entry equals it.

use std::path::PathBuf;

use serde_json::Value;

/// Handle to the on-disk membership list.
///
/// The file is re-read on every lookup so that a refreshed export takes
/// effect without a restart.
#[derive(Debug, Clone)]
pub struct MemberList {
    path: PathBuf,
}

impl MemberList {
    /// Creates a handle to the list at `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if `email` appears in the list.
    ///
    /// A missing or malformed list is treated as empty.
    pub async fn is_member(&self, email: &str) -> bool {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "membership list unavailable");
                return false;
            }
        };
        match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(entries) => contains_email(&entries, email),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "membership list malformed");
                false
            }
        }
    }
}

fn contains_email(entries: &[Value], email: &str) -> bool {
    entries
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|entry| entry.values())
        .any(|value| value.as_str() == Some(email))
}
