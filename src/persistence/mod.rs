//! Persistence layer: a narrow record-store contract and its backends.
//!
//! Services never talk to a database directly. They issue [`Query`]s and
//! [`Statement`]s against a [`RecordStore`], which resolves the logical
//! [`Table`] to a physical name from configuration. Two backends exist:
//!
//! - [`postgres::PostgresStore`]: `sqlx::PgPool` backed, rows are
//!   projected to JSONB and filtered by containment.
//! - [`memory::MemoryStore`]: in-process maps, used by tests and when
//!   persistence is disabled.
//!
//! Every read returns rows in ascending `id` order. Callers rely on this
//! to make participant ordering reproducible.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::TableNames;

/// A single stored row: column name to JSON value.
pub type Record = Map<String, Value>;

/// Logical record kinds known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Events.
    Events,
    /// Humans (registrants).
    Humans,
    /// Roles.
    Roles,
    /// Prices per (event, role).
    Prices,
    /// Capacity limits per (event, role).
    Limits,
    /// Participations linking a human to an event.
    Participants,
}

impl Table {
    /// Resolves the physical table name from configuration.
    #[must_use]
    pub fn resolve(self, names: &TableNames) -> &str {
        match self {
            Self::Events => &names.events,
            Self::Humans => &names.humans,
            Self::Roles => &names.roles,
            Self::Prices => &names.prices,
            Self::Limits => &names.limits,
            Self::Participants => &names.participants,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Events => "events",
            Self::Humans => "humans",
            Self::Roles => "roles",
            Self::Prices => "prices",
            Self::Limits => "limits",
            Self::Participants => "participants",
        };
        f.write_str(name)
    }
}

/// Equality-predicate read against one table.
///
/// All filters are combined with AND. A filter on `Value::Null` matches
/// rows where the column is null or absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Target table.
    pub table: Table,
    /// Column equality predicates.
    pub filters: Record,
}

impl Query {
    /// Selects every row of `table`.
    #[must_use]
    pub fn all(table: Table) -> Self {
        Self {
            table,
            filters: Map::new(),
        }
    }

    /// Selects the row with the given primary key.
    #[must_use]
    pub fn by_id(table: Table, id: i64) -> Self {
        Self::all(table).filter("id", id)
    }

    /// Adds an equality predicate.
    #[must_use]
    pub fn filter(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.insert(column.to_string(), value.into());
        self
    }
}

/// Write operation against one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Inserts a new row. The store assigns the `id`.
    Insert {
        /// Target table.
        table: Table,
        /// Column values (must not contain `id`).
        values: Record,
    },
    /// Overwrites the given columns of the row with primary key `id`.
    Update {
        /// Target table.
        table: Table,
        /// Primary key of the row to update.
        id: i64,
        /// Columns to overwrite.
        values: Record,
    },
    /// Deletes every row matching the filters. An empty filter set is
    /// rejected rather than wiping the table.
    Delete {
        /// Target table.
        table: Table,
        /// Column equality predicates.
        filters: Record,
    },
}

impl Statement {
    /// Returns the table this statement targets.
    #[must_use]
    pub const fn table(&self) -> Table {
        match self {
            Self::Insert { table, .. } | Self::Update { table, .. } | Self::Delete { table, .. } => {
                *table
            }
        }
    }
}

/// Result of a successful [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationOutcome {
    /// Number of rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Primary key assigned by an insert.
    pub inserted_id: Option<i64>,
}

/// Record store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database reported an error.
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be decoded into the expected shape.
    #[error("cannot decode {table} record: {message}")]
    Decode {
        /// Table the row came from.
        table: Table,
        /// Decoder message.
        message: String,
    },

    /// A column name is not a plain SQL identifier.
    #[error("invalid column name: {0:?}")]
    InvalidIdentifier(String),

    /// The statement was refused before reaching storage.
    #[error("statement rejected: {0}")]
    Rejected(String),

    /// An insert collided with a unique key.
    #[error("unique key violated: {0}")]
    Conflict(String),
}

/// Generic persistence for typed records keyed by numeric id.
///
/// Implementations must return rows in ascending `id` order and must not
/// leak engine-specific behaviour to callers.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Returns the first row (lowest id) matching `query`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn get_one(&self, query: &Query) -> Result<Option<Record>, StoreError>;

    /// Returns every row matching `query`, ids ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn get_all(&self, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Applies an insert, update or delete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the statement is rejected or the backend
    /// fails.
    async fn mutate(&self, statement: &Statement) -> Result<MutationOutcome, StoreError>;

    /// Returns the highest id currently stored in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn newest_id(&self, table: Table) -> Result<Option<i64>, StoreError>;
}

/// Fetches one row and decodes it as `T`.
///
/// # Errors
///
/// Returns [`StoreError`] on backend failure or if the row does not match
/// `T`.
pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn RecordStore,
    query: &Query,
) -> Result<Option<T>, StoreError> {
    store
        .get_one(query)
        .await?
        .map(|record| decode(query.table, record))
        .transpose()
}

/// Fetches every matching row and decodes each as `T`.
///
/// # Errors
///
/// Returns [`StoreError`] on backend failure or if any row does not match
/// `T`.
pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RecordStore,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    store
        .get_all(query)
        .await?
        .into_iter()
        .map(|record| decode(query.table, record))
        .collect()
}

/// Decodes a raw record as `T`.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if the record does not match `T`.
pub fn decode<T: DeserializeOwned>(table: Table, record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Decode {
        table,
        message: e.to_string(),
    })
}

/// Encodes a serializable value as a [`Record`].
///
/// # Errors
///
/// Returns [`StoreError::Rejected`] if `value` does not serialize to a
/// JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(StoreError::Rejected(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::Rejected(e.to_string())),
    }
}
