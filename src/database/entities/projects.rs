use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::snapshot::{SnapshotMap, Tracked};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    /// What the project sets out to achieve.
    pub target: String,
    /// Filled in when the project wraps up; its first appearance is
    /// recorded as a `field_added` history event.
    pub conclusion: Option<String>,
    pub status: Option<String>,
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
        belongs_to = "super::project_categories::Entity",
        from = "Column::CategoryId",
        to = "super::project_categories::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::project_categories::Entity",
        from = "Column::SubcategoryId",
        to = "super::project_categories::Column::Id"
    )]
    Subcategory,
    #[sea_orm(has_many = "super::project_history::Entity")]
    History,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::project_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Tracked for Model {
    const TRACKED_FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "target",
        "conclusion",
        "status",
        "category_id",
        "subcategory_id",
        "priority",
    ];

    const STATUS_FIELD: Option<&'static str> = Some("status");

    const ADDED_FIELD: Option<&'static str> = Some("conclusion");

    fn entity_id(&self) -> i32 {
        self.id
    }

    fn snapshot(&self) -> SnapshotMap {
        let mut map = SnapshotMap::new();
        map.insert("title".to_string(), json!(self.title));
        map.insert("description".to_string(), json!(self.description));
        map.insert("target".to_string(), json!(self.target));
        map.insert("conclusion".to_string(), json!(self.conclusion));
        map.insert("status".to_string(), json!(self.status));
        map.insert("category_id".to_string(), json!(self.category_id));
        map.insert("subcategory_id".to_string(), json!(self.subcategory_id));
        map.insert("priority".to_string(), json!(self.priority));
        map
    }
}
