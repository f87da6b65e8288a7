//! Limit service: runs the allocator and serves limit lookups.

use std::sync::Arc;

use serde_json::json;

use super::catalog;
use super::participant_registry::ParticipantRegistry;
use crate::domain::{EventSummary, LimitDetail, LimitRecord, LimitView, RoleRef, allocate};
use crate::error::EventumError;
use crate::persistence::{
    Query, RecordStore, Statement, StoreError, Table, encode, fetch_all, fetch_one,
};

/// Orchestration layer for capacity limits.
///
/// [`LimitService::get_limits`] is the only place fill counts are written:
/// every call recomputes them from the current registry and persists the
/// result, so repeated calls converge on the same numbers.
#[derive(Debug, Clone)]
pub struct LimitService {
    store: Arc<dyn RecordStore>,
    registry: ParticipantRegistry,
}

impl LimitService {
    /// Creates a new `LimitService`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, registry: ParticipantRegistry) -> Self {
        Self { store, registry }
    }

    /// Recomputes and persists the fill counts of an event's limits and
    /// returns the refreshed listing.
    ///
    /// Limits appear in id order with their roles resolved. When some
    /// participants could not be absorbed, a synthetic `overflow` entry
    /// without id is appended; it is never stored.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::Storage`] if limits, roles or participants
    /// cannot be read. Failed fill-count writes are logged and skipped.
    pub async fn get_limits(&self, event_id: i64) -> Result<Vec<LimitView>, EventumError> {
        let limits = self.event_limits(event_id).await?;
        let roles = catalog::load_roles(self.store.as_ref()).await?;
        let participants = self.registry.list_participants(event_id).await?;

        let allocation = allocate(&roles, &limits, &participants);
        tracing::debug!(
            event_id,
            participants = participants.len(),
            fills = allocation.fills.len(),
            overflow = allocation.overflow_count(),
            "allocation computed"
        );

        for fill in &allocation.fills {
            let values = encode(&json!({ "filled": fill.filled }))?;
            let update = Statement::Update {
                table: Table::Limits,
                id: fill.limit_id,
                values,
            };
            match self.store.mutate(&update).await {
                Ok(outcome) if outcome.rows_affected == 0 => {
                    tracing::warn!(limit_id = fill.limit_id, "limit vanished before fill update");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(limit_id = fill.limit_id, error = %e, "cannot persist fill count");
                }
            }
        }

        let refreshed = self.event_limits(event_id).await?;
        let roles = catalog::roles_by_id(&roles);
        let mut views: Vec<LimitView> = refreshed
            .into_iter()
            .map(|limit| LimitView {
                id: Some(limit.id),
                role: limit
                    .role_id
                    .and_then(|role_id| roles.get(&role_id))
                    .map(|role| RoleRef::from(*role)),
                size: limit.size,
                filled: limit.filled,
            })
            .collect();
        if !allocation.overflow.is_empty() {
            views.push(LimitView::overflow(allocation.overflow_count()));
        }
        Ok(views)
    }

    /// Fetches a single limit by id.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::LimitNotFound`] if no such limit exists.
    pub async fn get_limit(&self, limit_id: i64) -> Result<LimitDetail, EventumError> {
        let record: LimitRecord = fetch_one(self.store.as_ref(), &Query::by_id(Table::Limits, limit_id))
            .await?
            .ok_or_else(|| EventumError::LimitNotFound(format!("id {limit_id}")))?;
        self.detail(record).await
    }

    /// Fetches the limit of `role_id` in an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::LimitNotFound`] if the pair has no limit.
    pub async fn get_limit_for_role(
        &self,
        event_id: i64,
        role_id: i64,
    ) -> Result<LimitDetail, EventumError> {
        let record = self.find_for_role(event_id, role_id).await?;
        self.detail(record).await
    }

    /// Creates a limit for an event, either for one role or event-wide.
    ///
    /// # Errors
    ///
    /// - [`EventumError::EventNotFound`] / [`EventumError::RoleNotFound`]
    ///   if a referenced record is missing.
    /// - [`EventumError::DuplicateLimit`] if the pair already has a limit.
    pub async fn create_limit(
        &self,
        event_id: i64,
        size: u32,
        role_id: Option<i64>,
    ) -> Result<LimitDetail, EventumError> {
        catalog::find_event(self.store.as_ref(), event_id).await?;
        if let Some(role_id) = role_id {
            catalog::find_role(self.store.as_ref(), role_id).await?;
        }

        let existing: Option<LimitRecord> = fetch_one(
            self.store.as_ref(),
            &Query::all(Table::Limits)
                .filter("event_id", event_id)
                .filter("role_id", role_id),
        )
        .await?;
        let duplicate = || EventumError::DuplicateLimit {
            event_id,
            role: role_id.map_or_else(|| "all roles".to_string(), |id| format!("role {id}")),
        };
        if existing.is_some() {
            return Err(duplicate());
        }

        let values = encode(&json!({
            "event_id": event_id,
            "role_id": role_id,
            "size": size,
            "filled": 0,
        }))?;
        let outcome = match self
            .store
            .mutate(&Statement::Insert {
                table: Table::Limits,
                values,
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(StoreError::Conflict(_)) => return Err(duplicate()),
            Err(e) => return Err(e.into()),
        };
        let limit_id = outcome
            .inserted_id
            .ok_or_else(|| EventumError::Internal("limit insert returned no id".to_string()))?;

        tracing::info!(event_id, ?role_id, size, limit_id, "limit created");
        self.get_limit(limit_id).await
    }

    /// Changes the size of the limit of `role_id` in an event.
    ///
    /// The fill count is left as is until the next allocation.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::LimitNotFound`] if the pair has no limit.
    pub async fn update_limit(
        &self,
        event_id: i64,
        role_id: i64,
        size: u32,
    ) -> Result<LimitDetail, EventumError> {
        let record = self.find_for_role(event_id, role_id).await?;
        let values = encode(&json!({ "size": size }))?;
        self.store
            .mutate(&Statement::Update {
                table: Table::Limits,
                id: record.id,
                values,
            })
            .await?;

        tracing::info!(event_id, role_id, size, limit_id = record.id, "limit updated");
        self.get_limit(record.id).await
    }

    async fn event_limits(&self, event_id: i64) -> Result<Vec<LimitRecord>, EventumError> {
        Ok(fetch_all(
            self.store.as_ref(),
            &Query::all(Table::Limits).filter("event_id", event_id),
        )
        .await?)
    }

    async fn find_for_role(&self, event_id: i64, role_id: i64) -> Result<LimitRecord, EventumError> {
        fetch_one(
            self.store.as_ref(),
            &Query::all(Table::Limits)
                .filter("event_id", event_id)
                .filter("role_id", role_id),
        )
        .await?
        .ok_or_else(|| EventumError::LimitNotFound(format!("event {event_id}, role {role_id}")))
    }

    async fn detail(&self, record: LimitRecord) -> Result<LimitDetail, EventumError> {
        let event = catalog::find_event(self.store.as_ref(), record.event_id).await?;
        let role = match record.role_id {
            Some(role_id) => Some(catalog::find_role(self.store.as_ref(), role_id).await?),
            None => None,
        };
        Ok(LimitDetail {
            id: record.id,
            event: EventSummary::from(&event),
            role,
            size: record.size,
            filled: record.filled,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::testing::{FALLBACK_ROLE, GUEST_ROLE, MEMBER_ROLE, Fixture};

    fn summary(views: &[LimitView]) -> Vec<(Option<String>, u32, u32)> {
        views
            .iter()
            .map(|v| (v.role.as_ref().map(|r| r.name.clone()), v.size, v.filled))
            .collect()
    }

    async fn limits(fx: &Fixture, event_id: i64) -> Vec<LimitView> {
        let Ok(views) = fx.limits.get_limits(event_id).await else {
            panic!("get_limits failed");
        };
        views
    }

    #[tokio::test]
    async fn overflow_lands_in_fallback_role() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.limit(event_id, Some(MEMBER_ROLE), 2).await;
        fx.limit(event_id, Some(FALLBACK_ROLE), 3).await;
        for _ in 0..4 {
            fx.participant(event_id, MEMBER_ROLE).await;
        }
        fx.participant(event_id, FALLBACK_ROLE).await;

        let views = limits(&fx, event_id).await;
        assert_eq!(
            summary(&views),
            vec![
                (Some("member".to_string()), 2, 2),
                (Some("other".to_string()), 3, 3),
            ]
        );
    }

    #[tokio::test]
    async fn unabsorbed_participants_get_synthetic_entry() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.limit(event_id, Some(MEMBER_ROLE), 1).await;
        fx.limit(event_id, Some(FALLBACK_ROLE), 1).await;
        for _ in 0..3 {
            fx.participant(event_id, MEMBER_ROLE).await;
        }
        fx.participant(event_id, GUEST_ROLE).await;

        let views = limits(&fx, event_id).await;
        assert_eq!(views.len(), 3);
        let Some(last) = views.last() else {
            panic!("no entries");
        };
        assert!(last.is_overflow());
        // guest and two members overflow, the fallback limit takes one
        assert_eq!((last.size, last.filled), (2, 2));
    }

    #[tokio::test]
    async fn overflow_without_fallback_limit_is_reported_not_stored() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.insert(
            Table::Limits,
            json!({"event_id": event_id, "role_id": MEMBER_ROLE, "size": 1, "filled": 1}),
        )
        .await;
        fx.limit(event_id, None, 10).await;
        for _ in 0..5 {
            fx.participant(event_id, MEMBER_ROLE).await;
        }
        fx.participant(event_id, FALLBACK_ROLE).await;

        let Ok(before) = fetch_all::<LimitRecord>(fx.store.as_ref(), &Query::all(Table::Limits)).await
        else {
            panic!("limits unreadable");
        };
        let views = limits(&fx, event_id).await;
        assert_eq!(
            summary(&views),
            vec![
                (Some("member".to_string()), 1, 1),
                (None, 10, 0),
                (Some("overflow".to_string()), 4, 4),
            ]
        );
        assert_eq!(views.last(), Some(&LimitView::overflow(4)));
        assert_eq!(
            views.last().and_then(|v| serde_json::to_value(v).ok()),
            Some(json!({"role": {"name": "overflow"}, "size": 4, "filled": 4}))
        );

        let Ok(after) = fetch_all::<LimitRecord>(fx.store.as_ref(), &Query::all(Table::Limits)).await
        else {
            panic!("limits unreadable");
        };
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn no_overflow_entry_when_everything_fits() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.limit(event_id, Some(MEMBER_ROLE), 5).await;
        fx.participant(event_id, MEMBER_ROLE).await;

        let views = limits(&fx, event_id).await;
        assert!(views.iter().all(|v| !v.is_overflow()));
        assert_eq!(summary(&views), vec![(Some("member".to_string()), 5, 1)]);
    }

    #[tokio::test]
    async fn repeated_calls_are_stable() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.limit(event_id, Some(MEMBER_ROLE), 1).await;
        fx.limit(event_id, Some(FALLBACK_ROLE), 1).await;
        for _ in 0..3 {
            fx.participant(event_id, MEMBER_ROLE).await;
        }

        let first = limits(&fx, event_id).await;
        let second = limits(&fx, event_id).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn event_wide_limit_is_reported_but_never_filled() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.limit(event_id, None, 10).await;
        fx.participant(event_id, MEMBER_ROLE).await;

        let views = limits(&fx, event_id).await;
        let Some(first) = views.first() else {
            panic!("no entries");
        };
        assert!(first.role.is_none());
        assert_eq!(first.filled, 0);
        assert!(views.last().is_some_and(LimitView::is_overflow));
    }

    #[tokio::test]
    async fn failed_fill_write_is_skipped() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        let stuck = fx.limit(event_id, Some(MEMBER_ROLE), 5).await;
        fx.limit(event_id, Some(FALLBACK_ROLE), 5).await;
        fx.participant(event_id, MEMBER_ROLE).await;
        fx.participant(event_id, FALLBACK_ROLE).await;
        assert!(fx.memory.reject_updates(Table::Limits, stuck).is_ok());

        let views = limits(&fx, event_id).await;
        assert_eq!(
            summary(&views),
            vec![
                (Some("member".to_string()), 5, 0),
                (Some("other".to_string()), 5, 1),
            ]
        );
    }

    #[tokio::test]
    async fn other_events_are_untouched() {
        let fx = Fixture::new(&[]).await;
        let gala = fx.event("Gala").await;
        let picnic = fx.event("Picnic").await;
        fx.limit(gala, Some(MEMBER_ROLE), 5).await;
        let picnic_limit = fx.limit(picnic, Some(MEMBER_ROLE), 5).await;
        fx.participant(gala, MEMBER_ROLE).await;

        let _ = limits(&fx, gala).await;
        let Ok(detail) = fx.limits.get_limit(picnic_limit).await else {
            panic!("limit missing");
        };
        assert_eq!(detail.filled, 0);
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_unknown_refs() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;

        let Ok(created) = fx.limits.create_limit(event_id, 4, Some(MEMBER_ROLE)).await else {
            panic!("create failed");
        };
        assert_eq!(created.event.id, event_id);
        assert_eq!(created.role.map(|r| r.id), Some(MEMBER_ROLE));

        let dup = fx.limits.create_limit(event_id, 9, Some(MEMBER_ROLE)).await;
        assert!(matches!(dup, Err(EventumError::DuplicateLimit { .. })));

        assert!(fx.limits.create_limit(event_id, 9, None).await.is_ok());
        let dup_wide = fx.limits.create_limit(event_id, 9, None).await;
        let Err(EventumError::DuplicateLimit { role, .. }) = dup_wide else {
            panic!("expected duplicate");
        };
        assert_eq!(role, "all roles");

        let no_event = fx.limits.create_limit(99, 1, None).await;
        assert!(matches!(no_event, Err(EventumError::EventNotFound(99))));
        let no_role = fx.limits.create_limit(event_id, 1, Some(42)).await;
        assert!(matches!(no_role, Err(EventumError::RoleNotFound(42))));
    }

    #[tokio::test]
    async fn update_changes_size_of_role_limit() {
        let fx = Fixture::new(&[]).await;
        let event_id = fx.event("Gala").await;
        fx.limit(event_id, Some(GUEST_ROLE), 2).await;

        let Ok(updated) = fx.limits.update_limit(event_id, GUEST_ROLE, 7).await else {
            panic!("update failed");
        };
        assert_eq!(updated.size, 7);

        let Ok(fetched) = fx.limits.get_limit_for_role(event_id, GUEST_ROLE).await else {
            panic!("lookup failed");
        };
        assert_eq!(fetched.id, updated.id);

        let missing = fx.limits.update_limit(event_id, MEMBER_ROLE, 1).await;
        assert!(matches!(missing, Err(EventumError::LimitNotFound(_))));
    }
}
