//! Database operations for workflow registries.

use chrono::Utc;
use sea_orm::*;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::entity::workflow_registry;
use crate::error::{AppError, AppResult};
use crate::models::WorkflowRegistry;

/// Fields of a registry to create.
#[derive(Debug)]
pub struct NewRegistry<'a> {
    pub registry_type: &'a str,
    pub name: &'a str,
    pub uri: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a SecretString,
}

pub async fn insert(db: &DatabaseConnection, new: NewRegistry<'_>) -> AppResult<WorkflowRegistry> {
    let model = workflow_registry::ActiveModel {
        id: Set(Uuid::new_v4()),
        registry_type: Set(new.registry_type.to_lowercase()),
        name: Set(new.name.to_string()),
        uri: Set(new.uri.to_string()),
        client_id: Set(new.client_id.to_string()),
        client_secret: Set(new.client_secret.expose_secret().to_string()),
        created_at: Set(Utc::now()),
    };

    let inserted = model.insert(db).await.map_err(|e| {
        AppError::Database(format!("Failed to insert registry '{}': {}", new.name, e))
    })?;

    Ok(model_to_registry(inserted))
}

pub async fn list_all(db: &DatabaseConnection) -> AppResult<Vec<WorkflowRegistry>> {
    let rows = workflow_registry::Entity::find()
        .order_by_asc(workflow_registry::Column::Name)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(model_to_registry).collect())
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<WorkflowRegistry>> {
    Ok(workflow_registry::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(model_to_registry))
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> AppResult<Option<WorkflowRegistry>> {
    Ok(workflow_registry::Entity::find()
        .filter(workflow_registry::Column::Name.eq(name))
        .one(db)
        .await?
        .map(model_to_registry))
}

pub async fn find_by_uri(db: &DatabaseConnection, uri: &str) -> AppResult<Option<WorkflowRegistry>> {
    Ok(workflow_registry::Entity::find()
        .filter(workflow_registry::Column::Uri.eq(uri))
        .one(db)
        .await?
        .map(model_to_registry))
}

fn model_to_registry(m: workflow_registry::Model) -> WorkflowRegistry {
    WorkflowRegistry {
        id: m.id,
        registry_type: m.registry_type,
        name: m.name,
        uri: m.uri,
        client_id: m.client_id,
        client_secret: SecretString::from(m.client_secret),
        created_at: m.created_at,
    }
}
