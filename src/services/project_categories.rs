//! Project category tree, backed by the `project_categories` table.
//! Mirrors the content category store over its own table and dependents.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use crate::database::entities::{project_categories, projects};
use crate::errors::CoreResult;
use crate::services::taxonomy::{
    NewNode, OrderBy, OrderDirection, QueryOptions, TaxonomyNode, TaxonomyService, TaxonomyStore,
};

pub type ProjectCategoryService = TaxonomyService<ProjectCategoryStore>;

pub fn project_category_service(db: DatabaseConnection) -> ProjectCategoryService {
    TaxonomyService::new(ProjectCategoryStore::new(db))
}

#[derive(Clone)]
pub struct ProjectCategoryStore {
    db: DatabaseConnection,
}

impl ProjectCategoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn ordered(options: &QueryOptions) -> Select<project_categories::Entity> {
        let column = match options.order_by {
            OrderBy::Priority => project_categories::Column::Priority,
            OrderBy::Name => project_categories::Column::Name,
            OrderBy::CreatedAt => project_categories::Column::CreatedAt,
            OrderBy::UpdatedAt => project_categories::Column::UpdatedAt,
        };
        let order = match options.direction {
            OrderDirection::Asc => Order::Asc,
            OrderDirection::Desc => Order::Desc,
        };
        project_categories::Entity::find().order_by(column, order)
    }
}

impl From<project_categories::Model> for TaxonomyNode {
    fn from(model: project_categories::Model) -> Self {
        TaxonomyNode {
            id: model.id,
            name: model.name,
            description: model.description,
            parent_id: model.parent_id,
            is_active: model.is_active,
            priority: model.priority,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl TaxonomyStore for ProjectCategoryStore {
    fn kind(&self) -> &'static str {
        "Project category"
    }

    fn dependent_kind(&self) -> &'static str {
        "projects"
    }

    async fn find_by_id(&self, id: i32) -> CoreResult<Option<TaxonomyNode>> {
        Ok(project_categories::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn find_sibling(
        &self,
        name: &str,
        parent_id: Option<i32>,
    ) -> CoreResult<Option<TaxonomyNode>> {
        let parent_filter = match parent_id {
            Some(parent_id) => project_categories::Column::ParentId.eq(parent_id),
            None => project_categories::Column::ParentId.is_null(),
        };
        Ok(project_categories::Entity::find()
            .filter(project_categories::Column::Name.eq(name))
            .filter(parent_filter)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn find_all(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        let models = Self::ordered(options).all(&self.db).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_active(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        let models = Self::ordered(options)
            .filter(project_categories::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_roots(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        let models = Self::ordered(options)
            .filter(project_categories::Column::ParentId.is_null())
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_children(
        &self,
        parent_id: i32,
        options: &QueryOptions,
    ) -> CoreResult<Vec<TaxonomyNode>> {
        let models = Self::ordered(options)
            .filter(project_categories::Column::ParentId.eq(parent_id))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_children(&self, id: i32) -> CoreResult<u64> {
        Ok(project_categories::Entity::find()
            .filter(project_categories::Column::ParentId.eq(id))
            .count(&self.db)
            .await?)
    }

    async fn count_entity_refs(&self, id: i32) -> CoreResult<u64> {
        Ok(projects::Entity::find()
            .filter(
                Condition::any()
                    .add(projects::Column::CategoryId.eq(id))
                    .add(projects::Column::SubcategoryId.eq(id)),
            )
            .count(&self.db)
            .await?)
    }

    async fn insert(&self, node: NewNode) -> CoreResult<TaxonomyNode> {
        let now = Utc::now();
        let model = project_categories::ActiveModel {
            name: Set(node.name),
            description: Set(node.description),
            parent_id: Set(node.parent_id),
            is_active: Set(node.is_active),
            priority: Set(node.priority),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn update(&self, node: &TaxonomyNode) -> CoreResult<TaxonomyNode> {
        let model = project_categories::ActiveModel {
            id: Unchanged(node.id),
            name: Set(node.name.clone()),
            description: Set(node.description.clone()),
            parent_id: Set(node.parent_id),
            is_active: Set(node.is_active),
            priority: Set(node.priority),
            created_at: Unchanged(node.created_at),
            updated_at: Set(node.updated_at),
        }
        .update(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn delete(&self, id: i32) -> CoreResult<()> {
        project_categories::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
