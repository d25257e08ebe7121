use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::snapshot::{SnapshotMap, Tracked};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    /// JSON array of strings; element order is significant and is
    /// preserved as persisted.
    pub tags: Json,
    pub status: String,
    pub priority: i32,
    pub category_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    pub author_id: i32,
    pub last_updated_by_id: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::LastUpdatedById",
        to = "super::users::Column::Id"
    )]
    LastUpdatedBy,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::SubcategoryId",
        to = "super::categories::Column::Id"
    )]
    Subcategory,
    #[sea_orm(has_many = "super::content_history::Entity")]
    History,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::content_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Tracked for Model {
    const TRACKED_FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "tags",
        "status",
        "category_id",
        "subcategory_id",
    ];

    const STATUS_FIELD: Option<&'static str> = Some("status");

    const ADDED_FIELD: Option<&'static str> = None;

    fn entity_id(&self) -> i32 {
        self.id
    }

    fn snapshot(&self) -> SnapshotMap {
        let mut map = SnapshotMap::new();
        map.insert("title".to_string(), json!(self.title));
        map.insert("description".to_string(), json!(self.description));
        map.insert("tags".to_string(), self.tags.clone());
        map.insert("status".to_string(), json!(self.status));
        map.insert("category_id".to_string(), json!(self.category_id));
        map.insert("subcategory_id".to_string(), json!(self.subcategory_id));
        map
    }
}
