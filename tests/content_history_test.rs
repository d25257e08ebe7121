//! End-to-end audit trail tests for the content service.

use anyhow::Result;
use chrono::Utc;
use chronicle::auth::Principal;
use chronicle::database::entities::{content_history, contents, users};
use chronicle::database::setup_database;
use chronicle::services::content_service::{
    ContentService, CreateContentInput, UpdateContentInput,
};
use chronicle::services::history::HistoryAction;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::json;
use tempfile::NamedTempFile;

async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

async fn create_user(db: &DatabaseConnection, email: &str, role: &str) -> Result<users::Model> {
    let now = Utc::now();
    Ok(users::ActiveModel {
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set("hash".to_string()),
        role: Set(role.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

fn draft_input(title: &str) -> CreateContentInput {
    CreateContentInput {
        title: title.to_string(),
        description: "text".to_string(),
        tags: vec!["rust".to_string()],
        status: Some("draft".to_string()),
        category_id: None,
        subcategory_id: None,
        priority: Some(0),
    }
}

#[tokio::test]
async fn test_full_lifecycle_audit_trail() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = create_user(&db, "ana@example.com", "creator").await?;
    let actor = Principal::from(&user);
    let svc = ContentService::new(db.clone());

    // Create emits a single `created` record carrying the new snapshot.
    let content = svc.create(draft_input("A"), &actor).await?;

    let history = svc.get_history(content.id, &actor).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, HistoryAction::Created);
    assert!(history[0].previous_data.is_none());
    let new_data = history[0].new_data.as_ref().unwrap();
    assert_eq!(new_data["title"], json!("A"));
    assert_eq!(new_data["status"], json!("draft"));
    let view = history[0].user.as_ref().unwrap();
    assert_eq!(view.email, "ana@example.com");

    // Two fields change: one `updated` record, no status shortcut.
    svc.update(
        content.id,
        UpdateContentInput {
            title: Some("B".to_string()),
            status: Some("published".to_string()),
            ..Default::default()
        },
        &actor,
    )
    .await?;

    let history = svc.get_history(content.id, &actor).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, HistoryAction::Updated);
    let changes = history[0].changes.as_ref().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].field, "title");
    assert_eq!(changes[0].old_value, json!("A"));
    assert_eq!(changes[0].new_value, json!("B"));
    assert_eq!(changes[1].field, "status");
    assert_eq!(changes[1].old_value, json!("draft"));
    assert_eq!(changes[1].new_value, json!("published"));

    // Status-only change: `updated` plus the specialized record.
    svc.update(
        content.id,
        UpdateContentInput {
            status: Some("archived".to_string()),
            ..Default::default()
        },
        &actor,
    )
    .await?;

    let history = svc.get_history(content.id, &actor).await?;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].action, HistoryAction::StatusChanged);
    assert_eq!(
        history[0].previous_data.as_ref().unwrap()["status"],
        json!("published")
    );
    assert_eq!(
        history[0].new_data.as_ref().unwrap()["status"],
        json!("archived")
    );
    assert_eq!(history[1].action, HistoryAction::Updated);
    assert_eq!(history[1].changes.as_ref().unwrap().len(), 1);

    // Delete appends the final record before the row disappears.
    svc.remove(content.id, &actor).await?;

    assert!(contents::Entity::find_by_id(content.id)
        .one(&db)
        .await?
        .is_none());

    let rows = content_history::Entity::find()
        .filter(content_history::Column::ContentId.eq(content.id))
        .all(&db)
        .await?;
    assert_eq!(rows.len(), 5);
    let deleted: Vec<_> = rows.iter().filter(|r| r.action == "deleted").collect();
    assert_eq!(deleted.len(), 1);
    let previous: serde_json::Value =
        serde_json::from_str(deleted[0].previous_data.as_ref().unwrap())?;
    assert_eq!(previous["title"], json!("B"));
    assert!(deleted[0].new_data.is_none());

    Ok(())
}

#[tokio::test]
async fn test_identical_update_is_a_silent_noop() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = create_user(&db, "ana@example.com", "creator").await?;
    let actor = Principal::from(&user);
    let svc = ContentService::new(db.clone());

    let content = svc.create(draft_input("A"), &actor).await?;

    svc.update(
        content.id,
        UpdateContentInput {
            title: Some("A".to_string()),
            status: Some("draft".to_string()),
            tags: Some(vec!["rust".to_string()]),
            ..Default::default()
        },
        &actor,
    )
    .await?;

    let history = svc.get_history(content.id, &actor).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, HistoryAction::Created);

    Ok(())
}

#[tokio::test]
async fn test_tag_reordering_is_a_tracked_change() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = create_user(&db, "ana@example.com", "creator").await?;
    let actor = Principal::from(&user);
    let svc = ContentService::new(db.clone());

    let mut input = draft_input("A");
    input.tags = vec!["a".to_string(), "b".to_string()];
    let content = svc.create(input, &actor).await?;

    svc.update(
        content.id,
        UpdateContentInput {
            tags: Some(vec!["b".to_string(), "a".to_string()]),
            ..Default::default()
        },
        &actor,
    )
    .await?;

    let history = svc.get_history(content.id, &actor).await?;
    assert_eq!(history.len(), 2);
    let changes = history[0].changes.as_ref().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "tags");

    Ok(())
}

#[tokio::test]
async fn test_history_reads_are_owner_or_admin_gated() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let author = create_user(&db, "ana@example.com", "creator").await?;
    let other = create_user(&db, "bob@example.com", "creator").await?;
    let admin = create_user(&db, "root@example.com", "admin").await?;
    let svc = ContentService::new(db.clone());

    let content = svc
        .create(draft_input("A"), &Principal::from(&author))
        .await?;

    // Writes stay open to any creator.
    svc.update(
        content.id,
        UpdateContentInput {
            title: Some("B".to_string()),
            ..Default::default()
        },
        &Principal::from(&other),
    )
    .await?;
    let updated = contents::Entity::find_by_id(content.id)
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(updated.last_updated_by_id, Some(other.id));

    // Reads are not.
    let err = svc
        .get_history(content.id, &Principal::from(&other))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    assert!(svc
        .get_history(content.id, &Principal::from(&author))
        .await
        .is_ok());
    assert!(svc
        .get_history(content.id, &Principal::from(&admin))
        .await
        .is_ok());

    Ok(())
}

#[tokio::test]
async fn test_per_user_history_access_and_shape() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let author = create_user(&db, "ana@example.com", "creator").await?;
    let other = create_user(&db, "bob@example.com", "creator").await?;
    let admin = create_user(&db, "root@example.com", "admin").await?;
    let svc = ContentService::new(db.clone());

    let actor = Principal::from(&author);
    let content = svc.create(draft_input("A"), &actor).await?;

    let err = svc
        .get_history_by_user(author.id, &Principal::from(&other))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let own = svc.get_history_by_user(author.id, &actor).await?;
    assert_eq!(own.len(), 1);
    let entity = own[0].entity.as_ref().unwrap();
    assert_eq!(entity.id, content.id);
    assert_eq!(entity.title, "A");

    // Admin sees other users' history; the trail survives deletion,
    // though the entity reference no longer resolves.
    svc.remove(content.id, &actor).await?;
    let seen_by_admin = svc
        .get_history_by_user(author.id, &Principal::from(&admin))
        .await?;
    assert_eq!(seen_by_admin.len(), 2);
    assert_eq!(seen_by_admin[0].action, HistoryAction::Deleted);
    assert!(seen_by_admin[0].entity.is_none());

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_unknown_taxonomy_refs() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = create_user(&db, "ana@example.com", "creator").await?;
    let actor = Principal::from(&user);
    let svc = ContentService::new(db.clone());

    let mut input = draft_input("A");
    input.category_id = Some(999);
    let err = svc.create(input, &actor).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let mut input = draft_input("A");
    input.subcategory_id = Some(999);
    let err = svc.create(input, &actor).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    // Nothing was persisted and no history was written.
    assert_eq!(contents::Entity::find().all(&db).await?.len(), 0);
    assert_eq!(content_history::Entity::find().all(&db).await?.len(), 0);

    Ok(())
}
