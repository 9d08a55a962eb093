//! Users and their linked registry identities.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use uuid::Uuid;

/// An API caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A user's OAuth2 identity at one workflow registry.
///
/// Passed explicitly to every registry client call.
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub registry_id: Uuid,
    pub provider_user_id: String,
    pub access_token: SecretString,
    pub updated_at: DateTime<Utc>,
}
