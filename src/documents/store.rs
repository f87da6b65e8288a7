//! Plain-file storage for JSON and text documents.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::DocumentRoots;

/// Document storage failures.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Filesystem access failed.
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A JSON document could not be encoded or decoded.
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        /// Offending path.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

/// Reads and writes event templates, descriptions and submitted forms.
///
/// No locking is done: concurrent writers to the same path race.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    roots: DocumentRoots,
}

/// Reduces a display name to characters that are safe in a file name.
fn slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}

impl DocumentStore {
    /// Creates a store over the configured roots.
    #[must_use]
    pub fn new(roots: DocumentRoots) -> Self {
        Self { roots }
    }

    /// `<templates>/<id>_<name>.json`
    #[must_use]
    pub fn template_path(&self, event_id: i64, name: &str) -> PathBuf {
        self.roots
            .templates
            .join(format!("{event_id}_{}.json", slug(name)))
    }

    /// `<descriptions>/<id>_<name>.txt`
    #[must_use]
    pub fn description_path(&self, event_id: i64, name: &str) -> PathBuf {
        self.roots
            .descriptions
            .join(format!("{event_id}_{}.txt", slug(name)))
    }

    /// `<forms>/<id>_<name>`; holds one form file per participant.
    #[must_use]
    pub fn form_dir(&self, event_id: i64, name: &str) -> PathBuf {
        self.roots.forms.join(format!("{event_id}_{}", slug(name)))
    }

    /// `<form_dir>/<human_id>.json`
    #[must_use]
    pub fn form_path(&self, event_id: i64, event_name: &str, human_id: i64) -> PathBuf {
        self.form_dir(event_id, event_name)
            .join(format!("{human_id}.json"))
    }

    /// Creates `dir` and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the directory cannot be created.
    pub async fn ensure_dir(&self, dir: &Path) -> Result<(), DocumentError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| DocumentError::Io {
                path: dir.to_path_buf(),
                source,
            })
    }

    /// Serializes `value` as JSON into `path`, creating parent
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if encoding or writing fails.
    pub async fn write_json<T: Serialize + Sync>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), DocumentError> {
        let bytes = serde_json::to_vec(value).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_bytes(path, &bytes).await
    }

    /// Reads and decodes the JSON document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if reading or decoding fails.
    pub async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, DocumentError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes `text` into `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if writing fails.
    pub async fn write_text(&self, path: &Path, text: &str) -> Result<(), DocumentError> {
        self.write_bytes(path, text.as_bytes()).await
    }

    /// Reads the text document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if reading fails.
    pub async fn read_text(&self, path: &Path) -> Result<String, DocumentError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Deletes the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Io`] if the file cannot be removed.
    pub async fn remove(&self, path: &Path) -> Result<(), DocumentError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<(), DocumentError> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent).await?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &Path) -> DocumentStore {
        DocumentStore::new(DocumentRoots {
            templates: dir.join("templates"),
            descriptions: dir.join("descriptions"),
            forms: dir.join("forms"),
        })
    }

    #[test]
    fn paths_follow_id_and_name() {
        let store = store_in(Path::new("/srv"));
        assert_eq!(
            store.template_path(7, "Spring Gala"),
            PathBuf::from("/srv/templates/7_Spring_Gala.json")
        );
        assert_eq!(
            store.description_path(7, "Spring Gala"),
            PathBuf::from("/srv/descriptions/7_Spring_Gala.txt")
        );
        assert_eq!(
            store.form_path(7, "Spring Gala", 12),
            PathBuf::from("/srv/forms/7_Spring_Gala/12.json")
        );
    }

    #[test]
    fn names_cannot_escape_their_root() {
        let store = store_in(Path::new("/srv"));
        assert_eq!(
            store.template_path(1, "../../etc/passwd"),
            PathBuf::from("/srv/templates/1_______etc_passwd.json")
        );
        assert_eq!(
            store.form_dir(2, "   "),
            PathBuf::from("/srv/forms/2_unnamed")
        );
    }

    #[tokio::test]
    async fn json_and_text_round_trip_through_disk() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = store_in(dir.path());

        let template = store.template_path(1, "gala");
        let body = json!({"fields": [{"name": "email", "type": "text"}]});
        assert!(store.write_json(&template, &body).await.is_ok());
        let read: Result<serde_json::Value, _> = store.read_json(&template).await;
        assert_eq!(read.ok(), Some(body));

        let description = store.description_path(1, "gala");
        assert!(store.write_text(&description, "Black tie.").await.is_ok());
        assert_eq!(
            store.read_text(&description).await.ok().as_deref(),
            Some("Black tie.")
        );
    }

    #[tokio::test]
    async fn removing_a_missing_file_reports_the_path() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let store = store_in(dir.path());
        let missing = store.form_path(3, "gala", 9);
        let Err(err) = store.remove(&missing).await else {
            panic!("expected failure");
        };
        assert!(err.to_string().contains("9.json"));
    }
}
