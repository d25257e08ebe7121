use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).text().not_null())
                    .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .text()
                            .not_null()
                            .default("creator"),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create categories table (self-referencing tree)
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).text().not_null())
                    .col(ColumnDef::new(Categories::Description).text())
                    .col(ColumnDef::new(Categories::ParentId).integer())
                    .col(
                        ColumnDef::new(Categories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Categories::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Categories::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_parent_id")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create project_categories table (same shape, independent tree)
        manager
            .create_table(
                Table::create()
                    .table(ProjectCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectCategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectCategories::Name).text().not_null())
                    .col(ColumnDef::new(ProjectCategories::Description).text())
                    .col(ColumnDef::new(ProjectCategories::ParentId).integer())
                    .col(
                        ColumnDef::new(ProjectCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ProjectCategories::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectCategories::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectCategories::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_categories_parent_id")
                            .from(ProjectCategories::Table, ProjectCategories::ParentId)
                            .to(ProjectCategories::Table, ProjectCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create contents table
        manager
            .create_table(
                Table::create()
                    .table(Contents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contents::Title).text().not_null())
                    .col(ColumnDef::new(Contents::Description).text().not_null())
                    .col(ColumnDef::new(Contents::Tags).json().not_null())
                    .col(
                        ColumnDef::new(Contents::Status)
                            .text()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Contents::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Contents::CategoryId).integer())
                    .col(ColumnDef::new(Contents::SubcategoryId).integer())
                    .col(ColumnDef::new(Contents::AuthorId).integer().not_null())
                    .col(ColumnDef::new(Contents::LastUpdatedById).integer())
                    .col(ColumnDef::new(Contents::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Contents::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_author_id")
                            .from(Contents::Table, Contents::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_last_updated_by_id")
                            .from(Contents::Table, Contents::LastUpdatedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_category_id")
                            .from(Contents::Table, Contents::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contents_subcategory_id")
                            .from(Contents::Table, Contents::SubcategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Title).text().not_null())
                    .col(ColumnDef::new(Projects::Description).text().not_null())
                    .col(ColumnDef::new(Projects::Target).text().not_null())
                    .col(ColumnDef::new(Projects::Conclusion).text())
                    .col(ColumnDef::new(Projects::Status).text())
                    .col(
                        ColumnDef::new(Projects::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Projects::CategoryId).integer())
                    .col(ColumnDef::new(Projects::SubcategoryId).integer())
                    .col(ColumnDef::new(Projects::AuthorId).integer().not_null())
                    .col(ColumnDef::new(Projects::LastUpdatedById).integer())
                    .col(ColumnDef::new(Projects::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Projects::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_author_id")
                            .from(Projects::Table, Projects::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_last_updated_by_id")
                            .from(Projects::Table, Projects::LastUpdatedById)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_category_id")
                            .from(Projects::Table, Projects::CategoryId)
                            .to(ProjectCategories::Table, ProjectCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_subcategory_id")
                            .from(Projects::Table, Projects::SubcategoryId)
                            .to(ProjectCategories::Table, ProjectCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create history tables. No foreign key on the entity id: the
        // audit trail must survive deletion of the entity it describes.
        manager
            .create_table(
                Table::create()
                    .table(ContentHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContentHistory::Action).text().not_null())
                    .col(ColumnDef::new(ContentHistory::PreviousData).text())
                    .col(ColumnDef::new(ContentHistory::NewData).text())
                    .col(ColumnDef::new(ContentHistory::Changes).text())
                    .col(ColumnDef::new(ContentHistory::Notes).text())
                    .col(
                        ColumnDef::new(ContentHistory::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContentHistory::ContentId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContentHistory::UserId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectHistory::Action).text().not_null())
                    .col(ColumnDef::new(ProjectHistory::PreviousData).text())
                    .col(ColumnDef::new(ProjectHistory::NewData).text())
                    .col(ColumnDef::new(ProjectHistory::Changes).text())
                    .col(ColumnDef::new(ProjectHistory::Notes).text())
                    .col(
                        ColumnDef::new(ProjectHistory::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectHistory::ProjectId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectHistory::UserId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Create indexes for the common access paths
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_parent_id")
                    .table(Categories::Table)
                    .col(Categories::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_categories_parent_id")
                    .table(ProjectCategories::Table)
                    .col(ProjectCategories::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_history_content_id")
                    .table(ContentHistory::Table)
                    .col(ContentHistory::ContentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_history_user_id")
                    .table(ContentHistory::Table)
                    .col(ContentHistory::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_history_project_id")
                    .table(ProjectHistory::Table)
                    .col(ProjectHistory::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_history_user_id")
                    .table(ProjectHistory::Table)
                    .col(ProjectHistory::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ContentHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Contents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProjectCategories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    Description,
    ParentId,
    IsActive,
    Priority,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProjectCategories {
    Table,
    Id,
    Name,
    Description,
    ParentId,
    IsActive,
    Priority,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Contents {
    Table,
    Id,
    Title,
    Description,
    Tags,
    Status,
    Priority,
    CategoryId,
    SubcategoryId,
    AuthorId,
    LastUpdatedById,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Title,
    Description,
    Target,
    Conclusion,
    Status,
    Priority,
    CategoryId,
    SubcategoryId,
    AuthorId,
    LastUpdatedById,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ContentHistory {
    Table,
    Id,
    Action,
    PreviousData,
    NewData,
    Changes,
    Notes,
    CreatedAt,
    ContentId,
    UserId,
}

#[derive(Iden)]
enum ProjectHistory {
    Table,
    Id,
    Action,
    PreviousData,
    NewData,
    Changes,
    Notes,
    CreatedAt,
    ProjectId,
    UserId,
}
