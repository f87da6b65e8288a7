//! Shared read helpers for events, roles and prices.

use std::collections::HashMap;

use crate::domain::{EventRecord, PriceRecord, PriceView, Role, RolePower};
use crate::error::EventumError;
use crate::persistence::{Query, RecordStore, Table, fetch_all, fetch_one};

/// Loads every role, ids ascending.
///
/// # Errors
///
/// Returns [`EventumError::Storage`] if the store fails.
pub async fn load_roles(store: &dyn RecordStore) -> Result<Vec<Role>, EventumError> {
    Ok(fetch_all(store, &Query::all(Table::Roles)).await?)
}

/// Indexes roles by primary key.
#[must_use]
pub fn roles_by_id(roles: &[Role]) -> HashMap<i64, &Role> {
    roles.iter().map(|role| (role.id, role)).collect()
}

/// Fetches a role by id.
///
/// # Errors
///
/// Returns [`EventumError::RoleNotFound`] if no such role exists.
pub async fn find_role(store: &dyn RecordStore, role_id: i64) -> Result<Role, EventumError> {
    fetch_one(store, &Query::by_id(Table::Roles, role_id))
        .await?
        .ok_or(EventumError::RoleNotFound(role_id))
}

/// Returns the lowest-id role with the given power.
///
/// # Errors
///
/// Returns [`EventumError::MissingRole`] if no role has that power.
pub async fn role_with_power(
    store: &dyn RecordStore,
    power: RolePower,
) -> Result<Role, EventumError> {
    fetch_one(store, &Query::all(Table::Roles).filter("power", power.get()))
        .await?
        .ok_or(EventumError::MissingRole(power.get()))
}

/// Fetches an event record by id.
///
/// # Errors
///
/// Returns [`EventumError::EventNotFound`] if no such event exists.
pub async fn find_event(
    store: &dyn RecordStore,
    event_id: i64,
) -> Result<EventRecord, EventumError> {
    fetch_one(store, &Query::by_id(Table::Events, event_id))
        .await?
        .ok_or(EventumError::EventNotFound(event_id))
}

/// Loads the prices of an event with their roles resolved.
///
/// # Errors
///
/// Returns [`EventumError::Storage`] if the store fails.
pub async fn prices_for_event(
    store: &dyn RecordStore,
    event_id: i64,
    roles: &[Role],
) -> Result<Vec<PriceView>, EventumError> {
    let records: Vec<PriceRecord> =
        fetch_all(store, &Query::all(Table::Prices).filter("event_id", event_id)).await?;
    let roles = roles_by_id(roles);
    Ok(records
        .into_iter()
        .map(|record| PriceView {
            id: record.id,
            role: roles.get(&record.role_id).map(|role| (*role).clone()),
            price: record.price,
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::Statement;
    use crate::persistence::memory::MemoryStore;
    use serde_json::{Value, json};

    async fn insert(store: &MemoryStore, table: Table, value: Value) {
        let Value::Object(values) = value else {
            panic!("expected object literal");
        };
        let Ok(_) = store.mutate(&Statement::Insert { table, values }).await else {
            panic!("insert failed");
        };
    }

    #[tokio::test]
    async fn role_with_power_picks_lowest_id() {
        let store = MemoryStore::new();
        insert(&store, Table::Roles, json!({"name": "member", "power": 3})).await;
        insert(&store, Table::Roles, json!({"name": "honorary", "power": 3})).await;

        let Ok(role) = role_with_power(&store, RolePower::MEMBER).await else {
            panic!("member role missing");
        };
        assert_eq!(role.name, "member");

        let missing = role_with_power(&store, RolePower::FALLBACK).await;
        assert!(matches!(missing, Err(EventumError::MissingRole(1))));
    }

    #[tokio::test]
    async fn prices_resolve_roles() {
        let store = MemoryStore::new();
        insert(&store, Table::Roles, json!({"name": "other", "power": 1})).await;
        insert(&store, Table::Prices, json!({"event_id": 1, "role_id": 1, "price": 12.5})).await;
        insert(&store, Table::Prices, json!({"event_id": 1, "role_id": 9, "price": 3.0})).await;
        insert(&store, Table::Prices, json!({"event_id": 2, "role_id": 1, "price": 1.0})).await;

        let Ok(roles) = load_roles(&store).await else {
            panic!("roles failed");
        };
        let Ok(prices) = prices_for_event(&store, 1, &roles).await else {
            panic!("prices failed");
        };
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.first().and_then(|p| p.role.as_ref()).map(|r| r.id), Some(1));
        assert!(prices.get(1).is_some_and(|p| p.role.is_none()));
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let store = MemoryStore::new();
        let result = find_event(&store, 5).await;
        assert!(matches!(result, Err(EventumError::EventNotFound(5))));
    }
}
