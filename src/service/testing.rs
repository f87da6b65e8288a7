//! Shared fixture for service tests.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::{Days, Utc};
use serde_json::{Value, json};
use tempfile::TempDir;

use super::{EventService, LimitService, ParticipantRegistry};
use crate::config::DocumentRoots;
use crate::documents::{DocumentStore, MemberList};
use crate::persistence::memory::MemoryStore;
use crate::persistence::{RecordStore, Statement, Table};

pub(crate) const FALLBACK_ROLE: i64 = 1;
pub(crate) const GUEST_ROLE: i64 = 2;
pub(crate) const MEMBER_ROLE: i64 = 3;

/// Services over a seeded in-memory store and a temporary document root.
pub(crate) struct Fixture {
    _dir: TempDir,
    pub memory: MemoryStore,
    pub store: Arc<dyn RecordStore>,
    pub documents: DocumentStore,
    pub registry: ParticipantRegistry,
    pub limits: LimitService,
    pub events: EventService,
}

impl Fixture {
    /// Seeds the roles `other` (1), `guest` (2) and `member` (3) and
    /// writes `members` as the membership list.
    pub async fn new(members: &[&str]) -> Self {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir unavailable");
        };
        let roots = DocumentRoots {
            templates: dir.path().join("templates"),
            descriptions: dir.path().join("descriptions"),
            forms: dir.path().join("forms"),
        };
        let memberlist = dir.path().join("memberlist.json");
        let entries: Vec<Value> = members.iter().map(|email| json!({"Mail": email})).collect();
        let Ok(bytes) = serde_json::to_vec(&entries) else {
            panic!("memberlist encoding failed");
        };
        let Ok(()) = std::fs::write(&memberlist, bytes) else {
            panic!("memberlist write failed");
        };

        let memory = MemoryStore::new();
        let store: Arc<dyn RecordStore> = Arc::new(memory.clone());
        let documents = DocumentStore::new(roots);
        let registry =
            ParticipantRegistry::new(Arc::clone(&store), documents.clone(), MemberList::new(memberlist));
        let limits = LimitService::new(Arc::clone(&store), registry.clone());
        let events = EventService::new(
            Arc::clone(&store),
            documents.clone(),
            registry.clone(),
            limits.clone(),
            30,
        );

        let fx = Self {
            _dir: dir,
            memory,
            store,
            documents,
            registry,
            limits,
            events,
        };
        for (name, power) in [("other", 1), ("guest", 2), ("member", 3)] {
            fx.insert(Table::Roles, json!({"name": name, "power": power})).await;
        }
        fx
    }

    pub async fn insert(&self, table: Table, value: Value) -> i64 {
        let Value::Object(values) = value else {
            panic!("expected object literal");
        };
        let Ok(outcome) = self.store.mutate(&Statement::Insert { table, values }).await else {
            panic!("insert into {table} failed");
        };
        let Some(id) = outcome.inserted_id else {
            panic!("insert into {table} returned no id");
        };
        id
    }

    /// Inserts an event row directly, expiring in ten days.
    pub async fn event(&self, name: &str) -> i64 {
        let expire = Utc::now().date_naive() + Days::new(10);
        self.insert(
            Table::Events,
            json!({
                "name": name,
                "template": "missing.json",
                "updated": Utc::now(),
                "expire": expire,
                "description": null,
                "available": true,
            }),
        )
        .await
    }

    pub async fn limit(&self, event_id: i64, role_id: Option<i64>, size: u32) -> i64 {
        self.insert(
            Table::Limits,
            json!({"event_id": event_id, "role_id": role_id, "size": size, "filled": 0}),
        )
        .await
    }

    /// Inserts a fresh human holding `role_id` and registers it.
    pub async fn participant(&self, event_id: i64, role_id: i64) -> i64 {
        let Ok(newest) = self.store.newest_id(Table::Humans).await else {
            panic!("humans unreadable");
        };
        let email = format!("someone{}@x.org", newest.unwrap_or(0) + 1);
        let human_id = self
            .insert(
                Table::Humans,
                json!({
                    "name": "Someone",
                    "email": email,
                    "signed": Utc::now(),
                    "role_id": role_id,
                }),
            )
            .await;
        self.insert(
            Table::Participants,
            json!({"event_id": event_id, "human_id": human_id, "form": "missing.json", "paid": 0}),
        )
        .await
    }
}
