//! Mutation orchestrator for content items.
//!
//! Entry point for the calling layer: validates taxonomy references,
//! applies the mutation, and drives the history recorder. Inputs arrive
//! already type/shape-validated; only referential and business-rule
//! validation happens here.

use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

use crate::auth::Principal;
use crate::database::entities::users::UserView;
use crate::database::entities::{categories, contents, users};
use crate::errors::{CoreError, CoreResult};
use crate::services::categories::{category_service, CategoryService};
use crate::services::content_history::ContentHistoryService;
use crate::services::history::{
    parse_changes, parse_payload, EntityRef, HistoryRecorder, HistoryView,
};
use crate::services::snapshot::Tracked;
use crate::services::taxonomy::{NodeRef, OrderDirection};

#[derive(Debug, Clone)]
pub struct CreateContentInput {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    pub priority: Option<i32>,
}

/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateContentInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrderBy {
    Priority,
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy)]
pub struct ContentQueryOptions {
    pub order_by: ContentOrderBy,
    pub direction: OrderDirection,
}

impl Default for ContentQueryOptions {
    fn default() -> Self {
        ContentQueryOptions {
            order_by: ContentOrderBy::Priority,
            direction: OrderDirection::Desc,
        }
    }
}

/// Content plus resolved display subsets. Only id/name/email fields of
/// related rows ever leave the core.
#[derive(Debug, Clone, Serialize)]
pub struct ContentView {
    #[serde(flatten)]
    pub content: contents::Model,
    pub author: Option<UserView>,
    pub last_updated_by: Option<UserView>,
    pub category: Option<NodeRef>,
    pub subcategory: Option<NodeRef>,
}

pub struct ContentService {
    db: DatabaseConnection,
    categories: CategoryService,
    history: HistoryRecorder<ContentHistoryService>,
}

impl ContentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            categories: category_service(db.clone()),
            history: HistoryRecorder::new(ContentHistoryService::new(db.clone())),
            db,
        }
    }

    pub async fn create(
        &self,
        input: CreateContentInput,
        actor: &Principal,
    ) -> CoreResult<contents::Model> {
        self.validate_refs(input.category_id, input.subcategory_id)
            .await?;

        let now = Utc::now();
        let content = contents::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            tags: Set(json!(input.tags)),
            status: Set(input.status.unwrap_or_else(|| "draft".to_string())),
            priority: Set(input.priority.unwrap_or(0)),
            category_id: Set(input.category_id),
            subcategory_id: Set(input.subcategory_id),
            author_id: Set(actor.id),
            last_updated_by_id: Set(Some(actor.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.history.record_created(&content, actor, None).await?;

        info!("content {} created by user {}", content.id, actor.id);
        Ok(content)
    }

    pub async fn update(
        &self,
        id: i32,
        input: UpdateContentInput,
        actor: &Principal,
    ) -> CoreResult<contents::Model> {
        let current = self.load(id).await?;
        self.validate_refs(input.category_id, input.subcategory_id)
            .await?;

        // Snapshot before any mutation; the diff runs against this, not
        // against a shared reference to the row being changed.
        let before = current.snapshot();

        let mut active: contents::ActiveModel = current.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(json!(tags));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(subcategory_id) = input.subcategory_id {
            active.subcategory_id = Set(Some(subcategory_id));
        }
        if let Some(priority) = input.priority {
            active.priority = Set(priority);
        }
        active.last_updated_by_id = Set(Some(actor.id));
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;

        self.history
            .record_updated(&updated, actor, &before, None)
            .await?;

        Ok(updated)
    }

    /// Hard delete. The `deleted` history record is appended first so
    /// the trail survives the removal.
    pub async fn remove(&self, id: i32, actor: &Principal) -> CoreResult<()> {
        let content = self.load(id).await?;

        self.history.record_deleted(&content, actor, None).await?;

        contents::Entity::delete_by_id(id).exec(&self.db).await?;
        info!("content {} deleted by user {}", id, actor.id);
        Ok(())
    }

    pub async fn find_one(&self, id: i32) -> CoreResult<ContentView> {
        let content = self.load(id).await?;
        let mut views = self.resolve_views(vec![content]).await?;
        Ok(views.remove(0))
    }

    pub async fn find_all(&self, options: &ContentQueryOptions) -> CoreResult<Vec<ContentView>> {
        let column = match options.order_by {
            ContentOrderBy::Priority => contents::Column::Priority,
            ContentOrderBy::CreatedAt => contents::Column::CreatedAt,
            ContentOrderBy::UpdatedAt => contents::Column::UpdatedAt,
            ContentOrderBy::Title => contents::Column::Title,
        };
        let order = match options.direction {
            OrderDirection::Asc => Order::Asc,
            OrderDirection::Desc => Order::Desc,
        };

        let models = contents::Entity::find()
            .order_by(column, order)
            .all(&self.db)
            .await?;
        self.resolve_views(models).await
    }

    /// Audit trail of one content item. Reads are owner/admin gated
    /// even though writes are not; the asymmetry is part of the access
    /// policy.
    pub async fn get_history(
        &self,
        content_id: i32,
        actor: &Principal,
    ) -> CoreResult<Vec<HistoryView>> {
        let content = self.load(content_id).await?;
        if !actor.is_admin() && content.author_id != actor.id {
            return Err(CoreError::forbidden(
                "You can only view history of your own content",
            ));
        }

        let entries = self.history.store().list_by_content(content_id).await?;
        entries
            .into_iter()
            .map(|(entry, user)| {
                Ok(HistoryView {
                    id: entry.id,
                    action: entry.action.into(),
                    changes: parse_changes(entry.changes.as_deref())?,
                    notes: entry.notes,
                    created_at: entry.created_at,
                    user: user.map(UserView::from),
                    entity: None,
                    previous_data: parse_payload(entry.previous_data.as_deref())?,
                    new_data: parse_payload(entry.new_data.as_deref())?,
                })
            })
            .collect()
    }

    /// Everything one user did across all content; admin or self only.
    pub async fn get_history_by_user(
        &self,
        user_id: i32,
        actor: &Principal,
    ) -> CoreResult<Vec<HistoryView>> {
        if !actor.is_admin() && actor.id != user_id {
            return Err(CoreError::forbidden(
                "You can only view your own content history",
            ));
        }

        let entries = self.history.store().list_by_user(user_id).await?;
        entries
            .into_iter()
            .map(|(entry, content)| {
                Ok(HistoryView {
                    id: entry.id,
                    action: entry.action.into(),
                    changes: parse_changes(entry.changes.as_deref())?,
                    notes: entry.notes,
                    created_at: entry.created_at,
                    user: None,
                    entity: content.map(|c| EntityRef {
                        id: c.id,
                        title: c.title,
                    }),
                    previous_data: parse_payload(entry.previous_data.as_deref())?,
                    new_data: parse_payload(entry.new_data.as_deref())?,
                })
            })
            .collect()
    }

    async fn load(&self, id: i32) -> CoreResult<contents::Model> {
        contents::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Content with id {} not found", id)))
    }

    async fn validate_refs(
        &self,
        category_id: Option<i32>,
        subcategory_id: Option<i32>,
    ) -> CoreResult<()> {
        if let Some(category_id) = category_id {
            self.categories.find_one(category_id).await?;
        }
        if let Some(subcategory_id) = subcategory_id {
            self.categories.find_one(subcategory_id).await?;
        }
        Ok(())
    }

    async fn resolve_views(&self, models: Vec<contents::Model>) -> CoreResult<Vec<ContentView>> {
        let user_ids: Vec<i32> = models
            .iter()
            .flat_map(|c| [Some(c.author_id), c.last_updated_by_id])
            .flatten()
            .collect();
        let category_ids: Vec<i32> = models
            .iter()
            .flat_map(|c| [c.category_id, c.subcategory_id])
            .flatten()
            .collect();

        let users: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let nodes: HashMap<i32, categories::Model> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let node_ref = |id: Option<i32>| {
            id.and_then(|id| nodes.get(&id)).map(|c| NodeRef {
                id: c.id,
                name: c.name.clone(),
            })
        };

        Ok(models
            .into_iter()
            .map(|content| ContentView {
                author: users.get(&content.author_id).cloned().map(UserView::from),
                last_updated_by: content
                    .last_updated_by_id
                    .and_then(|id| users.get(&id))
                    .cloned()
                    .map(UserView::from),
                category: node_ref(content.category_id),
                subcategory: node_ref(content.subcategory_id),
                content,
            })
            .collect())
    }
}
