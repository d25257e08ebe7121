//! Persistence for the project audit trail; append and read only.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use crate::database::entities::{project_history, projects, users};
use crate::errors::CoreResult;
use crate::services::history::{HistoryEntry, HistoryStore};

#[derive(Clone)]
pub struct ProjectHistoryService {
    db: DatabaseConnection,
}

impl ProjectHistoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_by_project(
        &self,
        project_id: i32,
    ) -> CoreResult<Vec<(project_history::Model, Option<users::Model>)>> {
        Ok(project_history::Entity::find()
            .filter(project_history::Column::ProjectId.eq(project_id))
            .find_also_related(users::Entity)
            .order_by_desc(project_history::Column::CreatedAt)
            .order_by_desc(project_history::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_by_user(
        &self,
        user_id: i32,
    ) -> CoreResult<Vec<(project_history::Model, Option<projects::Model>)>> {
        Ok(project_history::Entity::find()
            .filter(project_history::Column::UserId.eq(user_id))
            .find_also_related(projects::Entity)
            .order_by_desc(project_history::Column::CreatedAt)
            .order_by_desc(project_history::Column::Id)
            .all(&self.db)
            .await?)
    }
}

#[async_trait]
impl HistoryStore for ProjectHistoryService {
    async fn append(&self, entry: HistoryEntry) -> CoreResult<i32> {
        let model = project_history::ActiveModel {
            action: Set(entry.action.into()),
            previous_data: Set(entry.previous_data),
            new_data: Set(entry.new_data),
            changes: Set(entry.changes),
            notes: Set(entry.notes),
            created_at: Set(Utc::now()),
            project_id: Set(entry.entity_id),
            user_id: Set(entry.user_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.id)
    }
}
