//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::documents::{DocumentStore, MemberList};
use crate::persistence::RecordStore;
use crate::service::{EventService, LimitService, ParticipantRegistry};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event lifecycle.
    pub events: Arc<EventService>,
    /// Capacity limits and allocation.
    pub limits: Arc<LimitService>,
    /// Registration and payment.
    pub participants: Arc<ParticipantRegistry>,
}

impl AppState {
    /// Wires the services over `store` using `config` for document roots,
    /// the membership list and the retention window.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: &ServiceConfig) -> Self {
        let documents = DocumentStore::new(config.documents.clone());
        let members = MemberList::new(config.memberlist_path.clone());
        let registry = ParticipantRegistry::new(Arc::clone(&store), documents.clone(), members);
        let limits = LimitService::new(Arc::clone(&store), registry.clone());
        let events = EventService::new(
            store,
            documents,
            registry.clone(),
            limits.clone(),
            config.purge_after_days,
        );
        Self {
            events: Arc::new(events),
            limits: Arc::new(limits),
            participants: Arc::new(registry),
        }
    }
}
