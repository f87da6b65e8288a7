//! Participant registry: who is registered to which event.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use super::catalog;
use crate::documents::{DocumentStore, MemberList};
use crate::domain::{
    EventRecord, HumanRecord, Participant, ParticipantWithForm, ParticipationRecord,
    Registration, RolePower,
};
use crate::error::EventumError;
use crate::persistence::{
    Query, RecordStore, Statement, StoreError, Table, encode, fetch_all, fetch_one,
};

/// Resolves, registers and purges the participants of events.
///
/// Participants are always returned in participation-id order, which is
/// the order the allocator consumes them in.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    store: Arc<dyn RecordStore>,
    documents: DocumentStore,
    members: MemberList,
}

impl ParticipantRegistry {
    /// Creates a new `ParticipantRegistry`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, documents: DocumentStore, members: MemberList) -> Self {
        Self {
            store,
            documents,
            members,
        }
    }

    /// Lists the participants of an event with human and role resolved.
    ///
    /// Participations whose human or role no longer exists are skipped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::Storage`] if the store fails.
    pub async fn list_participants(&self, event_id: i64) -> Result<Vec<Participant>, EventumError> {
        Ok(self
            .resolve(event_id)
            .await?
            .into_iter()
            .map(|(participant, _)| participant)
            .collect())
    }

    /// Lists the participants of an event together with their forms.
    ///
    /// A form that cannot be read is reported as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::Storage`] if the store fails.
    pub async fn list_participants_with_forms(
        &self,
        event_id: i64,
    ) -> Result<Vec<ParticipantWithForm>, EventumError> {
        let resolved = self.resolve(event_id).await?;
        let mut out = Vec::with_capacity(resolved.len());
        for (participant, record) in resolved {
            let form = match self.documents.read_json(Path::new(&record.form)).await {
                Ok(form) => form,
                Err(e) => {
                    tracing::warn!(participation_id = record.id, error = %e, "form unreadable");
                    Value::Null
                }
            };
            out.push(ParticipantWithForm { participant, form });
        }
        Ok(out)
    }

    /// Registers the author of `form` to an event.
    ///
    /// The form must be an object carrying string `name` and `email`
    /// fields. The human is looked up by email and created on first
    /// registration, with the member role if the email is in the
    /// membership list and the fallback role otherwise.
    ///
    /// # Errors
    ///
    /// - [`EventumError::InvalidRequest`] if `name` or `email` is missing.
    /// - [`EventumError::EventNotFound`] if the event does not exist.
    /// - [`EventumError::AlreadyRegistered`] if the human already
    ///   participates.
    /// - [`EventumError::MissingRole`] if the required role is not
    ///   configured.
    pub async fn register(&self, event_id: i64, form: Value) -> Result<Registration, EventumError> {
        let (name, email) = registrant_identity(&form)?;
        let event = catalog::find_event(self.store.as_ref(), event_id).await?;

        let existing: Option<HumanRecord> = fetch_one(
            self.store.as_ref(),
            &Query::all(Table::Humans).filter("email", email.clone()),
        )
        .await?;
        let human = match existing {
            Some(human) => {
                let participation: Option<ParticipationRecord> = fetch_one(
                    self.store.as_ref(),
                    &Query::all(Table::Participants)
                        .filter("event_id", event_id)
                        .filter("human_id", human.id),
                )
                .await?;
                if participation.is_some() {
                    return Err(EventumError::AlreadyRegistered { event_id, email });
                }
                human
            }
            None => match self.create_human(name, email.clone()).await {
                Ok(human) => human,
                // a concurrent registration created the human first
                Err(EventumError::Storage(StoreError::Conflict(_))) => fetch_one(
                    self.store.as_ref(),
                    &Query::all(Table::Humans).filter("email", email.clone()),
                )
                .await?
                .ok_or_else(|| EventumError::Internal(format!("human {email} vanished")))?,
                Err(e) => return Err(e),
            },
        };

        let path = self.documents.form_path(event.id, &event.name, human.id);
        let values = encode(&json!({
            "event_id": event_id,
            "human_id": human.id,
            "form": path.to_string_lossy(),
            "paid": 0,
        }))?;
        let outcome = match self
            .store
            .mutate(&Statement::Insert {
                table: Table::Participants,
                values,
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(StoreError::Conflict(_)) => {
                return Err(EventumError::AlreadyRegistered { event_id, email });
            }
            Err(e) => return Err(e.into()),
        };
        let id = outcome
            .inserted_id
            .ok_or_else(|| EventumError::Internal("participation insert returned no id".to_string()))?;

        // only the registration that owns the row writes its form
        if let Err(e) = self.documents.write_json(&path, &form).await {
            let undo = Statement::Delete {
                table: Table::Participants,
                filters: Query::by_id(Table::Participants, id).filters,
            };
            if let Err(undo_err) = self.store.mutate(&undo).await {
                tracing::warn!(participation_id = id, error = %undo_err, "cannot drop participation without form");
            }
            return Err(e.into());
        }

        tracing::info!(event_id, human_id = human.id, participation_id = id, "participant registered");
        Ok(Registration {
            id,
            event_id,
            human_id: human.id,
            paid: 0,
            form,
        })
    }

    /// Overwrites the paid amount of a participation.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::ParticipationNotFound`] if no such
    /// participation exists.
    pub async fn set_payment(
        &self,
        participation_id: i64,
        paid: i32,
    ) -> Result<ParticipationRecord, EventumError> {
        let values = encode(&json!({ "paid": paid }))?;
        let outcome = self
            .store
            .mutate(&Statement::Update {
                table: Table::Participants,
                id: participation_id,
                values,
            })
            .await?;
        if outcome.rows_affected == 0 {
            return Err(EventumError::ParticipationNotFound(participation_id));
        }
        tracing::info!(participation_id, paid, "payment status updated");
        fetch_one(
            self.store.as_ref(),
            &Query::by_id(Table::Participants, participation_id),
        )
        .await?
        .ok_or(EventumError::ParticipationNotFound(participation_id))
    }

    /// Removes every participation of `event` and their form files.
    ///
    /// Rows and files are removed one by one. A failure is logged and
    /// the purge moves on. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`EventumError::Storage`] if the participations cannot be
    /// listed.
    pub async fn purge_participations(&self, event: &EventRecord) -> Result<u64, EventumError> {
        let records: Vec<ParticipationRecord> = fetch_all(
            self.store.as_ref(),
            &Query::all(Table::Participants).filter("event_id", event.id),
        )
        .await?;

        let mut removed = 0;
        for record in &records {
            if let Err(e) = self.documents.remove(Path::new(&record.form)).await {
                tracing::warn!(participation_id = record.id, error = %e, "cannot remove form");
            }
            let delete = Statement::Delete {
                table: Table::Participants,
                filters: Query::by_id(Table::Participants, record.id).filters,
            };
            match self.store.mutate(&delete).await {
                Ok(outcome) => removed += outcome.rows_affected,
                Err(e) => {
                    tracing::warn!(participation_id = record.id, error = %e, "cannot remove participation");
                }
            }
        }

        tracing::info!(event_id = event.id, removed, "participations purged");
        Ok(removed)
    }

    async fn resolve(
        &self,
        event_id: i64,
    ) -> Result<Vec<(Participant, ParticipationRecord)>, EventumError> {
        let records: Vec<ParticipationRecord> = fetch_all(
            self.store.as_ref(),
            &Query::all(Table::Participants).filter("event_id", event_id),
        )
        .await?;
        let roles = catalog::load_roles(self.store.as_ref()).await?;
        let roles = catalog::roles_by_id(&roles);

        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let human: Option<HumanRecord> =
                fetch_one(self.store.as_ref(), &Query::by_id(Table::Humans, record.human_id))
                    .await?;
            let Some(human) = human else {
                tracing::warn!(participation_id = record.id, human_id = record.human_id, "participant has no human");
                continue;
            };
            let Some(role) = roles.get(&human.role_id) else {
                tracing::warn!(human_id = human.id, role_id = human.role_id, "participant has unknown role");
                continue;
            };
            let participant = Participant {
                participation_id: record.id,
                human_id: human.id,
                name: human.name,
                email: human.email,
                role_id: role.id,
                role_power: role.power,
                paid: record.paid,
            };
            out.push((participant, record));
        }
        Ok(out)
    }

    async fn create_human(&self, name: String, email: String) -> Result<HumanRecord, EventumError> {
        let power = if self.members.is_member(&email).await {
            RolePower::MEMBER
        } else {
            RolePower::FALLBACK
        };
        let role = catalog::role_with_power(self.store.as_ref(), power).await?;
        let signed = Utc::now();

        let values = encode(&json!({
            "name": name,
            "email": email,
            "signed": signed,
            "role_id": role.id,
        }))?;
        let outcome = self
            .store
            .mutate(&Statement::Insert {
                table: Table::Humans,
                values,
            })
            .await?;
        let id = outcome
            .inserted_id
            .ok_or_else(|| EventumError::Internal("human insert returned no id".to_string()))?;

        tracing::info!(human_id = id, role = %role.name, "human created");
        Ok(HumanRecord {
            id,
            name,
            email,
            signed,
            role_id: role.id,
        })
    }
}

/// Extracts the registrant's name and email from a submitted form.
fn registrant_identity(form: &Value) -> Result<(String, String), EventumError> {
    let field = |key: &str| {
        form.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| EventumError::InvalidRequest(format!("form field {key:?} is required")))
    };
    Ok((field("name")?, field("email")?))
}
