//! Persistence for the content audit trail.
//!
//! Only append and the two read patterns exist; nothing here updates or
//! deletes rows.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use crate::database::entities::{content_history, contents, users};
use crate::errors::CoreResult;
use crate::services::history::{HistoryEntry, HistoryStore};

#[derive(Clone)]
pub struct ContentHistoryService {
    db: DatabaseConnection,
}

impl ContentHistoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Full trail of one content item, most recent first, with the
    /// acting user resolved.
    pub async fn list_by_content(
        &self,
        content_id: i32,
    ) -> CoreResult<Vec<(content_history::Model, Option<users::Model>)>> {
        Ok(content_history::Entity::find()
            .filter(content_history::Column::ContentId.eq(content_id))
            .find_also_related(users::Entity)
            .order_by_desc(content_history::Column::CreatedAt)
            .order_by_desc(content_history::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Everything one user did across all content, most recent first,
    /// with the affected content resolved where it still exists.
    pub async fn list_by_user(
        &self,
        user_id: i32,
    ) -> CoreResult<Vec<(content_history::Model, Option<contents::Model>)>> {
        Ok(content_history::Entity::find()
            .filter(content_history::Column::UserId.eq(user_id))
            .find_also_related(contents::Entity)
            .order_by_desc(content_history::Column::CreatedAt)
            .order_by_desc(content_history::Column::Id)
            .all(&self.db)
            .await?)
    }
}

#[async_trait]
impl HistoryStore for ContentHistoryService {
    async fn append(&self, entry: HistoryEntry) -> CoreResult<i32> {
        let model = content_history::ActiveModel {
            action: Set(entry.action.into()),
            previous_data: Set(entry.previous_data),
            new_data: Set(entry.new_data),
            changes: Set(entry.changes),
            notes: Set(entry.notes),
            created_at: Set(Utc::now()),
            content_id: Set(entry.entity_id),
            user_id: Set(entry.user_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.id)
    }
}
