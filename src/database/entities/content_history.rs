use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit log for contents. Rows are never updated or
/// deleted; `content_id` carries no foreign key, so the trail outlives
/// the content it describes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub action: String,
    /// JSON snapshot of tracked fields before the change.
    pub previous_data: Option<String>,
    /// JSON snapshot of tracked fields after the change.
    pub new_data: Option<String>,
    /// JSON array of field-level changes.
    pub changes: Option<String>,
    pub notes: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub content_id: i32,
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contents::Entity",
        from = "Column::ContentId",
        to = "super::contents::Column::Id"
    )]
    Content,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
