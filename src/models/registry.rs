//! Workflow registry models.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use uuid::Uuid;

/// An external workflow registry, e.g. a SEEK instance.
#[derive(Debug, Clone)]
pub struct WorkflowRegistry {
    pub id: Uuid,
    /// Registry client tag, e.g. `seek`
    pub registry_type: String,
    pub name: String,
    pub uri: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub created_at: DateTime<Utc>,
}

impl WorkflowRegistry {
    /// Base URI without trailing slashes.
    pub fn base_uri(&self) -> &str {
        self.uri.trim_end_matches('/')
    }

    pub fn to_response(&self) -> RegistryResponse {
        RegistryResponse {
            uuid: self.id,
            name: self.name.clone(),
            uri: self.uri.clone(),
            registry_type: self.registry_type.clone(),
        }
    }
}

/// Public view of a registry. Client credentials are never exposed.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryResponse {
    pub uuid: Uuid,
    pub name: String,
    pub uri: String,
    #[serde(rename = "type")]
    pub registry_type: String,
}

/// A workflow as listed by a registry for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRef {
    pub external_id: String,
    pub uuid: Option<Uuid>,
    pub name: String,
    pub version: Option<String>,
}
