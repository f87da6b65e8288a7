//! In-process record store.
//!
//! Keeps each table in a `BTreeMap` keyed by id, which gives the required
//! ascending-id read order for free. Ids come from a per-table counter and
//! are never reused, and inserts honour the unique keys the SQL schema
//! declares. Used by the test-suite and when the service runs with
//! `PERSISTENCE_ENABLED=false`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{MutationOutcome, Query, Record, RecordStore, Statement, StoreError, Table};
use crate::domain::RESERVED_ROLES;

/// Unique keys of `migrations/0001_init.sql`. Absent columns compare as
/// null, and two nulls collide like `COALESCE(role_id, 0)` does.
const UNIQUE_KEYS: &[(Table, &[&str])] = &[
    (Table::Humans, &["email"]),
    (Table::Participants, &["event_id", "human_id"]),
    (Table::Limits, &["event_id", "role_id"]),
];

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<Table, BTreeMap<i64, Record>>,
    last_ids: HashMap<Table, i64>,
    rejected_updates: HashSet<(Table, i64)>,
}

impl Tables {
    fn insert(&mut self, table: Table, values: &Record) -> Result<i64, StoreError> {
        if values.contains_key("id") {
            return Err(StoreError::Rejected(format!(
                "insert into {table} must not set id"
            )));
        }
        let rows = self.rows.entry(table).or_default();
        for (_, columns) in UNIQUE_KEYS.iter().filter(|(t, _)| *t == table) {
            let key: Record = columns
                .iter()
                .map(|column| {
                    let value = values.get(*column).cloned().unwrap_or(Value::Null);
                    ((*column).to_string(), value)
                })
                .collect();
            if rows.values().any(|record| matches(record, &key)) {
                return Err(StoreError::Conflict(format!(
                    "{table} ({}) already taken",
                    columns.join(", ")
                )));
            }
        }

        let last = self.last_ids.entry(table).or_insert(0);
        *last += 1;
        let id = *last;
        let mut record = values.clone();
        record.insert("id".to_string(), Value::from(id));
        rows.insert(id, record);
        Ok(id)
    }
}

/// Thread-safe in-memory [`RecordStore`].
///
/// Cloning yields a handle to the same underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the reserved roles, as a fresh database
    /// does after its migrations ran.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the store lock is poisoned.
    pub fn with_reserved_roles() -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut tables = store.lock()?;
            for (name, power) in RESERVED_ROLES {
                let mut values = Record::new();
                values.insert("name".to_string(), Value::from(name));
                values.insert("power".to_string(), Value::from(power.get()));
                tables.insert(Table::Roles, &values)?;
            }
        }
        Ok(store)
    }

    /// Makes every subsequent update of row `id` in `table` fail with
    /// [`StoreError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the store lock is poisoned.
    pub fn reject_updates(&self, table: Table, id: i64) -> Result<(), StoreError> {
        self.lock()?.rejected_updates.insert((table, id));
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }
}

/// A row matches when every filter column equals the stored value. Absent
/// columns compare as null.
fn matches(record: &Record, filters: &Record) -> bool {
    filters
        .iter()
        .all(|(column, expected)| record.get(column).unwrap_or(&Value::Null) == expected)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_one(&self, query: &Query) -> Result<Option<Record>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.rows.get(&query.table).and_then(|rows| {
            rows.values()
                .find(|record| matches(record, &query.filters))
                .cloned()
        }))
    }

    async fn get_all(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .rows
            .get(&query.table)
            .map(|rows| {
                rows.values()
                    .filter(|record| matches(record, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn mutate(&self, statement: &Statement) -> Result<MutationOutcome, StoreError> {
        let mut tables = self.lock()?;
        match statement {
            Statement::Insert { table, values } => {
                let id = tables.insert(*table, values)?;
                Ok(MutationOutcome {
                    rows_affected: 1,
                    inserted_id: Some(id),
                })
            }
            Statement::Update { table, id, values } => {
                if tables.rejected_updates.contains(&(*table, *id)) {
                    return Err(StoreError::Rejected(format!(
                        "update of {table} row {id} refused"
                    )));
                }
                let Some(record) = tables.rows.get_mut(table).and_then(|rows| rows.get_mut(id))
                else {
                    return Ok(MutationOutcome::default());
                };
                for (column, value) in values {
                    if column != "id" {
                        record.insert(column.clone(), value.clone());
                    }
                }
                Ok(MutationOutcome {
                    rows_affected: 1,
                    inserted_id: None,
                })
            }
            Statement::Delete { table, filters } => {
                if filters.is_empty() {
                    return Err(StoreError::Rejected(format!(
                        "unfiltered delete on {table}"
                    )));
                }
                let Some(rows) = tables.rows.get_mut(table) else {
                    return Ok(MutationOutcome::default());
                };
                let before = rows.len();
                rows.retain(|_, record| !matches(record, filters));
                Ok(MutationOutcome {
                    rows_affected: (before - rows.len()) as u64,
                    inserted_id: None,
                })
            }
        }
    }

    async fn newest_id(&self, table: Table) -> Result<Option<i64>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .rows
            .get(&table)
            .and_then(|rows| rows.keys().next_back().copied()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        let Value::Object(map) = value else {
            panic!("expected object literal");
        };
        map
    }

    async fn insert(store: &MemoryStore, table: Table, value: Value) -> i64 {
        let outcome = store
            .mutate(&Statement::Insert {
                table,
                values: record(value),
            })
            .await;
        let Ok(MutationOutcome {
            inserted_id: Some(id),
            ..
        }) = outcome
        else {
            panic!("insert failed");
        };
        id
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = insert(&store, Table::Roles, json!({"name": "other", "power": 1})).await;
        let b = insert(&store, Table::Roles, json!({"name": "member", "power": 3})).await;
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.newest_id(Table::Roles).await.ok().flatten(), Some(2));
        assert_eq!(store.newest_id(Table::Events).await.ok().flatten(), None);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = MemoryStore::new();
        insert(&store, Table::Participants, json!({"event_id": 1, "human_id": 1})).await;
        let newest = insert(&store, Table::Participants, json!({"event_id": 1, "human_id": 2})).await;
        let deleted = store
            .mutate(&Statement::Delete {
                table: Table::Participants,
                filters: Query::by_id(Table::Participants, newest).filters,
            })
            .await;
        assert_eq!(deleted.ok().map(|o| o.rows_affected), Some(1));
        assert_eq!(store.newest_id(Table::Participants).await.ok().flatten(), Some(1));

        let next = insert(&store, Table::Participants, json!({"event_id": 1, "human_id": 3})).await;
        assert_eq!(next, 3);
        let Ok(None) = store.get_one(&Query::by_id(Table::Participants, newest)).await else {
            panic!("deleted id was handed out again");
        };
    }

    #[tokio::test]
    async fn unique_keys_conflict() {
        let store = MemoryStore::new();
        insert(&store, Table::Humans, json!({"name": "A", "email": "a@x.org"})).await;
        let same_email = store
            .mutate(&Statement::Insert {
                table: Table::Humans,
                values: record(json!({"name": "B", "email": "a@x.org"})),
            })
            .await;
        assert!(matches!(same_email, Err(StoreError::Conflict(_))));

        insert(&store, Table::Participants, json!({"event_id": 1, "human_id": 1})).await;
        let twice = store
            .mutate(&Statement::Insert {
                table: Table::Participants,
                values: record(json!({"event_id": 1, "human_id": 1})),
            })
            .await;
        assert!(matches!(twice, Err(StoreError::Conflict(_))));
        insert(&store, Table::Participants, json!({"event_id": 2, "human_id": 1})).await;

        insert(&store, Table::Limits, json!({"event_id": 1, "role_id": null, "size": 3})).await;
        let second_wide = store
            .mutate(&Statement::Insert {
                table: Table::Limits,
                values: record(json!({"event_id": 1, "size": 4})),
            })
            .await;
        assert!(matches!(second_wide, Err(StoreError::Conflict(_))));

        // a refused insert consumes no id
        assert_eq!(insert(&store, Table::Humans, json!({"name": "C", "email": "c@x.org"})).await, 2);
    }

    #[tokio::test]
    async fn reserved_roles_are_seeded() {
        let Ok(store) = MemoryStore::with_reserved_roles() else {
            panic!("seeding failed");
        };
        let Ok(roles) = store.get_all(&Query::all(Table::Roles)).await else {
            panic!("query failed");
        };
        let seeded: Vec<_> = roles
            .iter()
            .map(|r| (r.get("name").cloned(), r.get("power").cloned()))
            .collect();
        assert_eq!(
            seeded,
            vec![
                (Some(json!("other")), Some(json!(1))),
                (Some(json!("member")), Some(json!(3))),
            ]
        );
        assert_eq!(insert(&store, Table::Roles, json!({"name": "guest", "power": 2})).await, 3);
    }

    #[tokio::test]
    async fn get_all_filters_and_orders_by_id() {
        let store = MemoryStore::new();
        insert(&store, Table::Limits, json!({"event_id": 2, "role_id": 1, "size": 5})).await;
        insert(&store, Table::Limits, json!({"event_id": 1, "role_id": 1, "size": 3})).await;
        insert(&store, Table::Limits, json!({"event_id": 2, "role_id": null, "size": 9})).await;

        let Ok(rows) = store
            .get_all(&Query::all(Table::Limits).filter("event_id", 2))
            .await
        else {
            panic!("query failed");
        };
        let ids: Vec<_> = rows.iter().filter_map(|r| r.get("id")).cloned().collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);

        let Ok(Some(event_wide)) = store
            .get_one(&Query::all(Table::Limits).filter("role_id", Value::Null))
            .await
        else {
            panic!("null filter found nothing");
        };
        assert_eq!(event_wide.get("size"), Some(&json!(9)));
    }

    #[tokio::test]
    async fn update_overwrites_columns_only() {
        let store = MemoryStore::new();
        let id = insert(&store, Table::Limits, json!({"event_id": 1, "size": 3, "filled": 0})).await;
        let outcome = store
            .mutate(&Statement::Update {
                table: Table::Limits,
                id,
                values: record(json!({"filled": 2, "id": 99})),
            })
            .await;
        assert_eq!(outcome.ok().map(|o| o.rows_affected), Some(1));

        let Ok(Some(row)) = store.get_one(&Query::by_id(Table::Limits, id)).await else {
            panic!("row vanished");
        };
        assert_eq!(row.get("filled"), Some(&json!(2)));
        assert_eq!(row.get("size"), Some(&json!(3)));
        assert_eq!(row.get("id"), Some(&json!(id)));
    }

    #[tokio::test]
    async fn update_of_missing_row_affects_nothing() {
        let store = MemoryStore::new();
        let outcome = store
            .mutate(&Statement::Update {
                table: Table::Participants,
                id: 42,
                values: record(json!({"paid": 1})),
            })
            .await;
        assert_eq!(outcome.ok().map(|o| o.rows_affected), Some(0));
    }

    #[tokio::test]
    async fn rejected_updates_fail() {
        let store = MemoryStore::new();
        let id = insert(&store, Table::Limits, json!({"size": 1, "filled": 0})).await;
        assert!(store.reject_updates(Table::Limits, id).is_ok());
        let outcome = store
            .mutate(&Statement::Update {
                table: Table::Limits,
                id,
                values: record(json!({"filled": 1})),
            })
            .await;
        assert!(matches!(outcome, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn delete_requires_filters() {
        let store = MemoryStore::new();
        insert(&store, Table::Participants, json!({"event_id": 1, "human_id": 1})).await;
        insert(&store, Table::Participants, json!({"event_id": 1, "human_id": 2})).await;
        insert(&store, Table::Participants, json!({"event_id": 2, "human_id": 1})).await;

        let unfiltered = store
            .mutate(&Statement::Delete {
                table: Table::Participants,
                filters: Record::new(),
            })
            .await;
        assert!(unfiltered.is_err());

        let outcome = store
            .mutate(&Statement::Delete {
                table: Table::Participants,
                filters: record(json!({"event_id": 1})),
            })
            .await;
        assert_eq!(outcome.ok().map(|o| o.rows_affected), Some(2));

        let remaining = store.get_all(&Query::all(Table::Participants)).await;
        assert_eq!(remaining.ok().map(|rows| rows.len()), Some(1));
    }

    #[tokio::test]
    async fn insert_refuses_explicit_id() {
        let store = MemoryStore::new();
        let outcome = store
            .mutate(&Statement::Insert {
                table: Table::Roles,
                values: record(json!({"id": 5, "name": "x"})),
            })
            .await;
        assert!(outcome.is_err());
    }
}
