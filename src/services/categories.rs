//! Content category tree, backed by the `categories` table.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

use crate::database::entities::{categories, contents};
use crate::errors::CoreResult;
use crate::services::taxonomy::{
    NewNode, OrderBy, OrderDirection, QueryOptions, TaxonomyNode, TaxonomyService, TaxonomyStore,
};

pub type CategoryService = TaxonomyService<CategoryStore>;

pub fn category_service(db: DatabaseConnection) -> CategoryService {
    TaxonomyService::new(CategoryStore::new(db))
}

#[derive(Clone)]
pub struct CategoryStore {
    db: DatabaseConnection,
}

impl CategoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn ordered(options: &QueryOptions) -> Select<categories::Entity> {
        let column = match options.order_by {
            OrderBy::Priority => categories::Column::Priority,
            OrderBy::Name => categories::Column::Name,
            OrderBy::CreatedAt => categories::Column::CreatedAt,
            OrderBy::UpdatedAt => categories::Column::UpdatedAt,
        };
        let order = match options.direction {
            OrderDirection::Asc => Order::Asc,
            OrderDirection::Desc => Order::Desc,
        };
        categories::Entity::find().order_by(column, order)
    }
}

impl From<categories::Model> for TaxonomyNode {
    fn from(model: categories::Model) -> Self {
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
impl TaxonomyStore for CategoryStore {
    fn kind(&self) -> &'static str {
        "Category"
    }

    fn dependent_kind(&self) -> &'static str {
        "content"
    }

    async fn find_by_id(&self, id: i32) -> CoreResult<Option<TaxonomyNode>> {
        Ok(categories::Entity::find_by_id(id)
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
            Some(parent_id) => categories::Column::ParentId.eq(parent_id),
            None => categories::Column::ParentId.is_null(),
        };
        Ok(categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
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
            .filter(categories::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_roots(&self, options: &QueryOptions) -> CoreResult<Vec<TaxonomyNode>> {
        let models = Self::ordered(options)
            .filter(categories::Column::ParentId.is_null())
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
            .filter(categories::Column::ParentId.eq(parent_id))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_children(&self, id: i32) -> CoreResult<u64> {
        Ok(categories::Entity::find()
            .filter(categories::Column::ParentId.eq(id))
            .count(&self.db)
            .await?)
    }

    async fn count_entity_refs(&self, id: i32) -> CoreResult<u64> {
        Ok(contents::Entity::find()
            .filter(
                Condition::any()
                    .add(contents::Column::CategoryId.eq(id))
                    .add(contents::Column::SubcategoryId.eq(id)),
            )
            .count(&self.db)
            .await?)
    }

    async fn insert(&self, node: NewNode) -> CoreResult<TaxonomyNode> {
        let now = Utc::now();
        let model = categories::ActiveModel {
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
        let model = categories::ActiveModel {
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
        categories::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
