//! Database operations for OAuth identities.

use chrono::Utc;
use sea_orm::*;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::entity::oauth_identity;
use crate::error::AppResult;
use crate::models::OAuthIdentity;

/// Link (or refresh) a user's identity at a registry.
pub async fn upsert(
    db: &DatabaseConnection,
    user_id: Uuid,
    registry_id: Uuid,
    provider_user_id: &str,
    access_token: &SecretString,
) -> AppResult<OAuthIdentity> {
    let now = Utc::now();
    let existing = oauth_identity::Entity::find()
        .filter(oauth_identity::Column::UserId.eq(user_id))
        .filter(oauth_identity::Column::RegistryId.eq(registry_id))
        .one(db)
        .await?;

    let saved = match existing {
        Some(m) => {
            let mut active: oauth_identity::ActiveModel = m.into();
            active.provider_user_id = Set(provider_user_id.to_string());
            active.access_token = Set(access_token.expose_secret().to_string());
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            oauth_identity::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                registry_id: Set(registry_id),
                provider_user_id: Set(provider_user_id.to_string()),
                access_token: Set(access_token.expose_secret().to_string()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await?
        }
    };

    Ok(model_to_identity(saved))
}

/// The identity of `user_id` at `registry_id`, if linked.
pub async fn find(
    db: &DatabaseConnection,
    user_id: Uuid,
    registry_id: Uuid,
) -> AppResult<Option<OAuthIdentity>> {
    let result = oauth_identity::Entity::find()
        .filter(oauth_identity::Column::UserId.eq(user_id))
        .filter(oauth_identity::Column::RegistryId.eq(registry_id))
        .one(db)
        .await?;

    Ok(result.map(model_to_identity))
}

fn model_to_identity(m: oauth_identity::Model) -> OAuthIdentity {
    OAuthIdentity {
        id: m.id,
        user_id: m.user_id,
        registry_id: m.registry_id,
        provider_user_id: m.provider_user_id,
        access_token: SecretString::from(m.access_token),
        updated_at: m.updated_at,
    }
}
