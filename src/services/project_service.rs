//! Mutation orchestrator for projects. Same flow as the content
//! service against the project-category tree, with the project-specific
//! lifecycle notes and the `conclusion` added-field rule.

use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::auth::Principal;
use crate::database::entities::users::UserView;
use crate::database::entities::{project_categories, projects, users};
use crate::errors::{CoreError, CoreResult};
use crate::services::history::{
    parse_changes, parse_payload, EntityRef, HistoryRecorder, HistoryView,
};
use crate::services::project_categories::{project_category_service, ProjectCategoryService};
use crate::services::project_history::ProjectHistoryService;
use crate::services::snapshot::Tracked;
use crate::services::taxonomy::{NodeRef, OrderDirection};

#[derive(Debug, Clone)]
pub struct CreateProjectInput {
    pub title: String,
    pub description: String,
    pub target: String,
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    pub priority: Option<i32>,
}

/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target: Option<String>,
    pub conclusion: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOrderBy {
    Priority,
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectQueryOptions {
    pub order_by: Option<ProjectOrderBy>,
    pub direction: Option<OrderDirection>,
    /// Restrict to projects filed under this category.
    pub category_id: Option<i32>,
}

/// Project plus resolved display subsets.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: projects::Model,
    pub author: Option<UserView>,
    pub last_updated_by: Option<UserView>,
    pub category: Option<NodeRef>,
    pub subcategory: Option<NodeRef>,
}

pub struct ProjectService {
    db: DatabaseConnection,
    categories: ProjectCategoryService,
    history: HistoryRecorder<ProjectHistoryService>,
}

impl ProjectService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            categories: project_category_service(db.clone()),
            history: HistoryRecorder::new(ProjectHistoryService::new(db.clone())),
            db,
        }
    }

    pub async fn create(
        &self,
        input: CreateProjectInput,
        actor: &Principal,
    ) -> CoreResult<projects::Model> {
        self.validate_refs(input.category_id, input.subcategory_id)
            .await?;

        let now = Utc::now();
        let project = projects::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            target: Set(input.target),
            conclusion: Set(None),
            status: Set(input.status),
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

        self.history
            .record_created(&project, actor, Some("Project created".to_string()))
            .await?;

        info!("project {} created by user {}", project.id, actor.id);
        Ok(project)
    }

    pub async fn update(
        &self,
        id: i32,
        input: UpdateProjectInput,
        actor: &Principal,
    ) -> CoreResult<projects::Model> {
        let current = self.load(id).await?;
        self.validate_refs(input.category_id, input.subcategory_id)
            .await?;

        let before = current.snapshot();

        let mut active: projects::ActiveModel = current.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(target) = input.target {
            active.target = Set(target);
        }
        if let Some(conclusion) = input.conclusion {
            active.conclusion = Set(Some(conclusion));
        }
        if let Some(status) = input.status {
            active.status = Set(Some(status));
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
            .record_updated(&updated, actor, &before, Some("Project updated".to_string()))
            .await?;

        Ok(updated)
    }

    /// Hard delete, audit record first.
    pub async fn remove(&self, id: i32, actor: &Principal) -> CoreResult<()> {
        let project = self.load(id).await?;

        self.history
            .record_deleted(&project, actor, Some("Project deleted".to_string()))
            .await?;

        projects::Entity::delete_by_id(id).exec(&self.db).await?;
        info!("project {} deleted by user {}", id, actor.id);
        Ok(())
    }

    pub async fn find_one(&self, id: i32) -> CoreResult<ProjectView> {
        let project = self.load(id).await?;
        let mut views = self.resolve_views(vec![project]).await?;
        Ok(views.remove(0))
    }

    pub async fn find_all(&self, options: &ProjectQueryOptions) -> CoreResult<Vec<ProjectView>> {
        let column = match options.order_by.unwrap_or(ProjectOrderBy::Priority) {
            ProjectOrderBy::Priority => projects::Column::Priority,
            ProjectOrderBy::CreatedAt => projects::Column::CreatedAt,
            ProjectOrderBy::UpdatedAt => projects::Column::UpdatedAt,
            ProjectOrderBy::Title => projects::Column::Title,
        };
        let order = match options.direction.unwrap_or(OrderDirection::Desc) {
            OrderDirection::Asc => Order::Asc,
            OrderDirection::Desc => Order::Desc,
        };

        let mut query = projects::Entity::find().order_by(column, order);
        if let Some(category_id) = options.category_id {
            query = query.filter(projects::Column::CategoryId.eq(category_id));
        }

        let models = query.all(&self.db).await?;
        self.resolve_views(models).await
    }

    /// Audit trail of one project; owner or admin only.
    pub async fn get_history(
        &self,
        project_id: i32,
        actor: &Principal,
    ) -> CoreResult<Vec<HistoryView>> {
        let project = self.load(project_id).await?;
        if !actor.is_admin() && project.author_id != actor.id {
            return Err(CoreError::forbidden(
                "You can only view history of your own projects",
            ));
        }

        let entries = self.history.store().list_by_project(project_id).await?;
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

    /// Everything one user did across all projects; admin or self only.
    pub async fn get_history_by_user(
        &self,
        user_id: i32,
        actor: &Principal,
    ) -> CoreResult<Vec<HistoryView>> {
        if !actor.is_admin() && actor.id != user_id {
            return Err(CoreError::forbidden(
                "You can only view your own project history",
            ));
        }

        let entries = self.history.store().list_by_user(user_id).await?;
        entries
            .into_iter()
            .map(|(entry, project)| {
                Ok(HistoryView {
                    id: entry.id,
                    action: entry.action.into(),
                    changes: parse_changes(entry.changes.as_deref())?,
                    notes: entry.notes,
                    created_at: entry.created_at,
                    user: None,
                    entity: project.map(|p| EntityRef {
                        id: p.id,
                        title: p.title,
                    }),
                    previous_data: parse_payload(entry.previous_data.as_deref())?,
                    new_data: parse_payload(entry.new_data.as_deref())?,
                })
            })
            .collect()
    }

    async fn load(&self, id: i32) -> CoreResult<projects::Model> {
        projects::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Project with id {} not found", id)))
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

    async fn resolve_views(&self, models: Vec<projects::Model>) -> CoreResult<Vec<ProjectView>> {
        let user_ids: Vec<i32> = models
            .iter()
            .flat_map(|p| [Some(p.author_id), p.last_updated_by_id])
            .flatten()
            .collect();
        let category_ids: Vec<i32> = models
            .iter()
            .flat_map(|p| [p.category_id, p.subcategory_id])
            .flatten()
            .collect();

        let users: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let nodes: HashMap<i32, project_categories::Model> = project_categories::Entity::find()
            .filter(project_categories::Column::Id.is_in(category_ids))
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
            .map(|project| ProjectView {
                author: users.get(&project.author_id).cloned().map(UserView::from),
                last_updated_by: project
                    .last_updated_by_id
                    .and_then(|id| users.get(&id))
                    .cloned()
                    .map(UserView::from),
                category: node_ref(project.category_id),
                subcategory: node_ref(project.subcategory_id),
                project,
            })
            .collect())
    }
}
