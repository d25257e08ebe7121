use anyhow::Result;
use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::auth::Role;
use crate::database::entities::{categories, project_categories, users};

/// Idempotent bootstrap data: one admin account and the root taxonomy
/// nodes a fresh deployment starts from. Skips everything if the admin
/// already exists.
pub async fn create_seed_data(db: &DatabaseConnection) -> Result<()> {
    let existing_admin = users::Entity::find()
        .filter(users::Column::Email.eq("admin@example.com"))
        .one(db)
        .await?;

    if existing_admin.is_some() {
        info!("seed data already present, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let admin = users::ActiveModel {
        name: Set("Administrator".to_string()),
        email: Set("admin@example.com".to_string()),
        // Placeholder; the auth layer rewrites this on first login setup.
        password_hash: Set(String::new()),
        role: Set(Role::Admin.into()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("created admin user with ID: {}", admin.id);

    for (name, priority) in [("General", 10), ("Tutorials", 5), ("References", 0)] {
        categories::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            parent_id: Set(None),
            is_active: Set(true),
            priority: Set(priority),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    for (name, priority) in [("Internal", 10), ("Client Work", 0)] {
        project_categories::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            parent_id: Set(None),
            is_active: Set(true),
            priority: Set(priority),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!("created root taxonomy nodes");
    Ok(())
}
