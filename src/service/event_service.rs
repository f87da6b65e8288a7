//! Event service: creation, listing and the detail view of events.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};

use super::catalog;
use super::limit_service::LimitService;
use super::participant_registry::ParticipantRegistry;
use crate::documents::DocumentStore;
use crate::domain::{EventDetail, EventRecord, EventSummary, NewEvent};
use crate::error::EventumError;
use crate::persistence::{Query, RecordStore, Statement, Table, encode, fetch_all};

/// Orchestration layer for events.
///
/// Listing and detail reads also enforce retention: once an event is more
/// than `purge_after_days` past its sign-up expiry, its participations are
/// purged on the next read.
#[derive(Debug, Clone)]
pub struct EventService {
    store: Arc<dyn RecordStore>,
    documents: DocumentStore,
    registry: ParticipantRegistry,
    limits: LimitService,
    purge_after_days: i64,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        documents: DocumentStore,
        registry: ParticipantRegistry,
        limits: LimitService,
        purge_after_days: i64,
    ) -> Self {
        Self {
            store,
            documents,
            registry,
            limits,
            purge_after_days,
        }
    }

    /// Creates an event and writes its documents.
    ///
    /// The template and description are stored under the id the event is
    /// about to receive, and the form directory is created up front.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::InvalidRequest`] for an empty name, or a
    /// storage/document error if a write fails.
    pub async fn create_event(&self, new: NewEvent) -> Result<EventDetail, EventumError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(EventumError::InvalidRequest("event name must not be empty".to_string()));
        }

        let next_id = self.store.newest_id(Table::Events).await?.map_or(1, |id| id + 1);
        let template = self.documents.template_path(next_id, name);
        let description = self.documents.description_path(next_id, name);
        self.documents.write_json(&template, &new.template).await?;
        self.documents.write_text(&description, &new.description).await?;
        self.documents.ensure_dir(&self.documents.form_dir(next_id, name)).await?;

        let values = encode(&json!({
            "name": name,
            "template": template.to_string_lossy(),
            "updated": Utc::now(),
            "expire": new.expire,
            "description": description.to_string_lossy(),
            "available": new.available,
        }))?;
        let outcome = self
            .store
            .mutate(&Statement::Insert {
                table: Table::Events,
                values,
            })
            .await?;
        let id = outcome
            .inserted_id
            .ok_or_else(|| EventumError::Internal("event insert returned no id".to_string()))?;
        if id != next_id {
            tracing::warn!(expected = next_id, actual = id, "event id raced; documents use the expected id");
        }

        tracing::info!(event_id = id, name, "event created");
        self.get_event(id, false).await
    }

    /// Lists every event without template or description.
    ///
    /// Events past the purge window have their participations removed
    /// first. A failing purge is logged and does not hide the event.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::Storage`] if events cannot be read.
    pub async fn list_events(&self) -> Result<Vec<EventSummary>, EventumError> {
        let events: Vec<EventRecord> = fetch_all(self.store.as_ref(), &Query::all(Table::Events)).await?;
        let today = Utc::now().date_naive();
        for event in &events {
            if let Err(e) = self.purge_if_due(event, today).await {
                tracing::warn!(event_id = event.id, error = %e, "purge failed");
            }
        }
        Ok(events.iter().map(EventSummary::from).collect())
    }

    /// Returns the full detail of an event.
    ///
    /// Limits are recomputed by the allocator. With
    /// `include_participants`, participants and their forms are attached;
    /// an event past the purge window is purged first and reports none.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::EventNotFound`] if the event does not exist.
    pub async fn get_event(
        &self,
        event_id: i64,
        include_participants: bool,
    ) -> Result<EventDetail, EventumError> {
        let event = catalog::find_event(self.store.as_ref(), event_id).await?;

        let participants = if include_participants {
            if self.purge_if_due(&event, Utc::now().date_naive()).await? {
                Some(Vec::new())
            } else {
                Some(self.registry.list_participants_with_forms(event_id).await?)
            }
        } else {
            None
        };

        let template = match self.documents.read_json::<Value>(Path::new(&event.template)).await {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!(event_id, error = %e, "template unreadable");
                Value::Null
            }
        };
        let description = match &event.description {
            Some(path) => self
                .documents
                .read_text(Path::new(path))
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(event_id, error = %e, "description unreadable");
                    String::new()
                }),
            None => String::new(),
        };

        let limits = self.limits.get_limits(event_id).await?;
        let roles = catalog::load_roles(self.store.as_ref()).await?;
        let prices = catalog::prices_for_event(self.store.as_ref(), event_id, &roles).await?;

        Ok(EventDetail {
            id: event.id,
            name: event.name,
            expire: event.expire,
            available: event.available,
            updated: event.updated,
            template,
            description,
            limits,
            prices,
            participants,
        })
    }

    /// Returns the simplified view of one event.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::EventNotFound`] if the event does not exist.
    pub async fn event_summary(&self, event_id: i64) -> Result<EventSummary, EventumError> {
        let event = catalog::find_event(self.store.as_ref(), event_id).await?;
        Ok(EventSummary::from(&event))
    }

    /// Purges the participations of `event` if `today` is past its
    /// retention window. Returns whether a purge ran.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::Storage`] if participations cannot be read.
    pub async fn purge_if_due(&self, event: &EventRecord, today: NaiveDate) -> Result<bool, EventumError> {
        if !event.purge_due(today, self.purge_after_days) {
            return Ok(false);
        }
        self.registry.purge_participations(event).await?;
        Ok(true)
    }
}
