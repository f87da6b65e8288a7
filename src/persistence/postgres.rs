//! PostgreSQL implementation of the record store.
//!
//! Rows are read as `to_jsonb(t)` so that every table shares one decoding
//! path, and equality predicates are expressed as a single JSONB
//! containment (`to_jsonb(t) @> $1`). Writes go through
//! `jsonb_populate_record`, which lets PostgreSQL cast each JSON value to
//! the column type (dates, timestamps, numerics) on its own.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{MutationOutcome, Query, Record, RecordStore, Statement, StoreError, Table};
use crate::config::{ServiceConfig, TableNames, is_identifier};

/// PostgreSQL-backed record store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    tables: TableNames,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }

    /// Opens a connection pool sized from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self::new(pool, config.tables.clone()))
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))
    }

    fn table(&self, table: Table) -> &str {
        table.resolve(&self.tables)
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Conflict(db.message().to_string()),
        _ => StoreError::Database(e.to_string()),
    }
}

fn into_record(table: Table, value: Value) -> Result<Record, StoreError> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::Decode {
            table,
            message: format!("expected a JSON object row, got {other}"),
        }),
    }
}

/// Validates and double-quotes column names.
fn column_list(values: &Record) -> Result<String, StoreError> {
    values
        .keys()
        .map(|column| {
            if is_identifier(column) {
                Ok(format!("\"{column}\""))
            } else {
                Err(StoreError::InvalidIdentifier(column.clone()))
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|columns| columns.join(", "))
}

fn select_sql(table: &str, single: bool) -> String {
    let limit = if single { " LIMIT 1" } else { "" };
    format!("SELECT to_jsonb(t) FROM \"{table}\" AS t WHERE to_jsonb(t) @> $1 ORDER BY t.id ASC{limit}")
}

fn insert_sql(table: &str, values: &Record) -> Result<String, StoreError> {
    if values.contains_key("id") {
        return Err(StoreError::Rejected(format!(
            "insert into {table} must not set id"
        )));
    }
    let columns = column_list(values)?;
    Ok(format!(
        "INSERT INTO \"{table}\" ({columns}) \
         SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1) RETURNING id"
    ))
}

fn update_sql(table: &str, values: &Record) -> Result<String, StoreError> {
    if values.is_empty() {
        return Err(StoreError::Rejected(format!("empty update on {table}")));
    }
    let columns = column_list(values)?;
    Ok(format!(
        "UPDATE \"{table}\" SET ({columns}) = \
         (SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", $1)) WHERE id = $2"
    ))
}

fn delete_sql(table: &str, filters: &Record) -> Result<String, StoreError> {
    if filters.is_empty() {
        return Err(StoreError::Rejected(format!("unfiltered delete on {table}")));
    }
    Ok(format!(
        "DELETE FROM \"{table}\" AS t WHERE to_jsonb(t) @> $1"
    ))
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn get_one(&self, query: &Query) -> Result<Option<Record>, StoreError> {
        let sql = select_sql(self.table(query.table), true);
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(query.filters.clone()))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(|value| into_record(query.table, value)).transpose()
    }

    async fn get_all(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let sql = select_sql(self.table(query.table), false);
        let rows = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(query.filters.clone()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter()
            .map(|value| into_record(query.table, value))
            .collect()
    }

    async fn mutate(&self, statement: &Statement) -> Result<MutationOutcome, StoreError> {
        let table = self.table(statement.table());
        match statement {
            Statement::Insert { values, .. } => {
                let sql = insert_sql(table, values)?;
                let id = sqlx::query_scalar::<_, i64>(&sql)
                    .bind(Value::Object(values.clone()))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_error)?;
                Ok(MutationOutcome {
                    rows_affected: 1,
                    inserted_id: Some(id),
                })
            }
            Statement::Update { id, values, .. } => {
                let mut values = values.clone();
                values.remove("id");
                let sql = update_sql(table, &values)?;
                let result = sqlx::query(&sql)
                    .bind(Value::Object(values))
                    .bind(*id)
                    .execute(&self.pool)
                    .await
                    .map_err(db_error)?;
                Ok(MutationOutcome {
                    rows_affected: result.rows_affected(),
                    inserted_id: None,
                })
            }
            Statement::Delete { filters, .. } => {
                let sql = delete_sql(table, filters)?;
                let result = sqlx::query(&sql)
                    .bind(Value::Object(filters.clone()))
                    .execute(&self.pool)
                    .await
                    .map_err(db_error)?;
                Ok(MutationOutcome {
                    rows_affected: result.rows_affected(),
                    inserted_id: None,
                })
            }
        }
    }

    async fn newest_id(&self, table: Table) -> Result<Option<i64>, StoreError> {
        let sql = format!("SELECT MAX(id) FROM \"{}\"", self.table(table));
        sqlx::query_scalar::<_, Option<i64>>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }
}
