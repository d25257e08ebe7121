//! Change-history recording.
//!
//! The recorder turns one entity mutation into one or more append-only
//! history entries: exactly one `created`/`updated`/`deleted` entry per
//! state-changing call, plus a specialized entry when the update matches
//! a recognized single-field pattern. Persistence goes through the
//! [`HistoryStore`] trait, which exposes append only — stored entries
//! are never modified.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::Principal;
use crate::database::entities::users::UserView;
use crate::errors::CoreResult;
use crate::services::snapshot::{diff, FieldChange, SnapshotMap, Tracked};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryAction {
    Created,
    Updated,
    StatusChanged,
    FieldAdded,
    Deleted,
}

impl From<HistoryAction> for String {
    fn from(action: HistoryAction) -> Self {
        match action {
            HistoryAction::Created => "created".to_string(),
            HistoryAction::Updated => "updated".to_string(),
            HistoryAction::StatusChanged => "status_changed".to_string(),
            HistoryAction::FieldAdded => "field_added".to_string(),
            HistoryAction::Deleted => "deleted".to_string(),
        }
    }
}

impl From<String> for HistoryAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "created" => HistoryAction::Created,
            "status_changed" => HistoryAction::StatusChanged,
            "field_added" => HistoryAction::FieldAdded,
            "deleted" => HistoryAction::Deleted,
            _ => HistoryAction::Updated,
        }
    }
}

/// A fully-populated history entry ready for persistence. JSON payloads
/// are serialized by the recorder so every store sees the same schema.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub entity_id: i32,
    pub user_id: i32,
    pub action: HistoryAction,
    pub previous_data: Option<String>,
    pub new_data: Option<String>,
    pub changes: Option<String>,
    pub notes: Option<String>,
}

/// Append-only persistence for history entries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> CoreResult<i32>;
}

/// Drives the diff engine and a [`HistoryStore`] to audit one mutation.
pub struct HistoryRecorder<S> {
    store: S,
}

impl<S: HistoryStore> HistoryRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn record_created<E: Tracked>(
        &self,
        entity: &E,
        actor: &Principal,
        notes: Option<String>,
    ) -> CoreResult<()> {
        let entry = HistoryEntry {
            entity_id: entity.entity_id(),
            user_id: actor.id,
            action: HistoryAction::Created,
            previous_data: None,
            new_data: Some(serialize_snapshot(&entity.snapshot())),
            changes: None,
            notes,
        };
        self.store.append(entry).await?;
        debug!("recorded created event for entity {}", entity.entity_id());
        Ok(())
    }

    /// Records an update against the snapshot captured before mutation.
    ///
    /// Writes nothing when no tracked field changed. When exactly one
    /// field changed and it is the entity's status field, a second
    /// `status_changed` entry is appended carrying only the before and
    /// after status. When the entity's added-notification field gained
    /// its first non-null value, a `field_added` entry is appended.
    /// Returns the computed changes.
    pub async fn record_updated<E: Tracked>(
        &self,
        entity_after: &E,
        actor: &Principal,
        snapshot_before: &SnapshotMap,
        notes: Option<String>,
    ) -> CoreResult<Vec<FieldChange>> {
        let snapshot_after = entity_after.snapshot();
        let changes = diff(E::TRACKED_FIELDS, snapshot_before, &snapshot_after);
        if changes.is_empty() {
            return Ok(changes);
        }

        let entry = HistoryEntry {
            entity_id: entity_after.entity_id(),
            user_id: actor.id,
            action: HistoryAction::Updated,
            previous_data: Some(serialize_snapshot(snapshot_before)),
            new_data: Some(serialize_snapshot(&snapshot_after)),
            changes: Some(serialize_changes(&changes)),
            notes,
        };
        self.store.append(entry).await?;

        if let Some(status_field) = E::STATUS_FIELD {
            if changes.len() == 1 && changes[0].field == status_field {
                self.record_status_changed(entity_after, actor, status_field, &changes[0])
                    .await?;
            }
        }

        if let Some(added_field) = E::ADDED_FIELD {
            if let Some(change) = changes
                .iter()
                .find(|c| c.field == added_field && c.old_value.is_null() && !c.new_value.is_null())
            {
                self.record_field_added(entity_after, actor, added_field, change)
                    .await?;
            }
        }

        debug!(
            "recorded updated event for entity {} ({} field(s) changed)",
            entity_after.entity_id(),
            changes.len()
        );
        Ok(changes)
    }

    /// Must be called, and the append committed, before the entity row
    /// is removed, so the trail survives the deletion.
    pub async fn record_deleted<E: Tracked>(
        &self,
        entity: &E,
        actor: &Principal,
        notes: Option<String>,
    ) -> CoreResult<()> {
        let entry = HistoryEntry {
            entity_id: entity.entity_id(),
            user_id: actor.id,
            action: HistoryAction::Deleted,
            previous_data: Some(serialize_snapshot(&entity.snapshot())),
            new_data: None,
            changes: None,
            notes,
        };
        self.store.append(entry).await?;
        debug!("recorded deleted event for entity {}", entity.entity_id());
        Ok(())
    }

    async fn record_status_changed<E: Tracked>(
        &self,
        entity: &E,
        actor: &Principal,
        status_field: &str,
        change: &FieldChange,
    ) -> CoreResult<()> {
        let entry = HistoryEntry {
            entity_id: entity.entity_id(),
            user_id: actor.id,
            action: HistoryAction::StatusChanged,
            previous_data: Some(
                serde_json::to_string(&json!({ status_field: change.old_value }))
                    .unwrap_or_default(),
            ),
            new_data: Some(
                serde_json::to_string(&json!({ status_field: change.new_value }))
                    .unwrap_or_default(),
            ),
            changes: Some(serialize_changes(std::slice::from_ref(change))),
            notes: None,
        };
        self.store.append(entry).await?;
        Ok(())
    }

    async fn record_field_added<E: Tracked>(
        &self,
        entity: &E,
        actor: &Principal,
        added_field: &str,
        change: &FieldChange,
    ) -> CoreResult<()> {
        let entry = HistoryEntry {
            entity_id: entity.entity_id(),
            user_id: actor.id,
            action: HistoryAction::FieldAdded,
            previous_data: None,
            new_data: Some(
                serde_json::to_string(&json!({ added_field: change.new_value }))
                    .unwrap_or_default(),
            ),
            changes: None,
            notes: Some(format!("{} added", added_field)),
        };
        self.store.append(entry).await?;
        Ok(())
    }
}

fn serialize_snapshot(snapshot: &SnapshotMap) -> String {
    serde_json::to_string(snapshot).unwrap_or_default()
}

fn serialize_changes(changes: &[FieldChange]) -> String {
    serde_json::to_string(changes).unwrap_or_default()
}

/// Reference to the tracked entity a history entry belongs to, embedded
/// in per-user history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: i32,
    pub title: String,
}

/// Read-side shape of one history entry. The JSON text columns are
/// deserialized at read time; failures surface as corruption errors.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub id: i32,
    pub action: HistoryAction,
    pub changes: Option<Vec<FieldChange>>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityRef>,
    pub previous_data: Option<Value>,
    pub new_data: Option<Value>,
}

pub(crate) fn parse_payload(text: Option<&str>) -> CoreResult<Option<Value>> {
    text.map(serde_json::from_str).transpose().map_err(Into::into)
}

pub(crate) fn parse_changes(text: Option<&str>) -> CoreResult<Option<Vec<FieldChange>>> {
    text.map(serde_json::from_str).transpose().map_err(Into::into)
}
