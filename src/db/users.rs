//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::User;

/// Create a user identified by the hash of their API key.
pub async fn insert(db: &DatabaseConnection, username: &str, api_key_hash: &str) -> AppResult<User> {
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        api_key_hash: Set(api_key_hash.to_string()),
        created_at: Set(Utc::now()),
    };

    let inserted = model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert user '{}': {}", username, e)))?;

    Ok(model_to_user(inserted))
}

/// Find a user by API key hash.
pub async fn find_by_key_hash(db: &DatabaseConnection, api_key_hash: &str) -> AppResult<Option<User>> {
    let result = user::Entity::find()
        .filter(user::Column::ApiKeyHash.eq(api_key_hash))
        .one(db)
        .await?;

    Ok(result.map(model_to_user))
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> AppResult<Option<User>> {
    let result = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    Ok(result.map(model_to_user))
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    Ok(user::Entity::find_by_id(id).one(db).await?.map(model_to_user))
}

fn model_to_user(m: user::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        created_at: m.created_at,
    }
}
