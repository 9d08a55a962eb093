//! Workflow registry clients.
//!
//! Every call acts on behalf of one user and takes that user's
//! [`OAuthIdentity`] for the registry explicitly. Clients are built by
//! [`RegistryClientFactory`] from the registry's type tag.

pub mod seek;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{OAuthIdentity, Workflow, WorkflowRef, WorkflowRegistry};
use crate::services::rocrate;

pub use seek::SeekClient;

/// Client for one external workflow registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    fn registry(&self) -> &WorkflowRegistry;

    fn http(&self) -> &reqwest::Client;

    /// Download `url` with the user's bearer token.
    async fn download_with_user_credentials(
        &self,
        url: &str,
        identity: &OAuthIdentity,
        max_size: usize,
    ) -> AppResult<Vec<u8>> {
        ensure_identity(self.registry(), identity)?;
        rocrate::download(self.http(), url, Some(&identity.access_token), max_size).await
    }

    /// Registry-side identifier of a workflow version.
    ///
    /// Defaults to `"{uuid},{version}"`.
    async fn external_id_for(
        &self,
        uuid: &Uuid,
        version: &str,
        identity: &OAuthIdentity,
    ) -> AppResult<String> {
        ensure_identity(self.registry(), identity)?;
        Ok(Workflow::default_external_id(uuid, version))
    }

    /// Workflows the user can see on the registry.
    async fn workflows_for_user(&self, identity: &OAuthIdentity) -> AppResult<Vec<WorkflowRef>>;

    /// Link from which the workflow version's RO-Crate can be fetched.
    fn build_readonly_link(&self, external_id: &str, version: &str) -> String;
}

/// Reject identities that belong to another registry.
pub fn ensure_identity(registry: &WorkflowRegistry, identity: &OAuthIdentity) -> AppResult<()> {
    if identity.registry_id != registry.id {
        return Err(AppError::Unauthorized(format!(
            "No identity linked to registry '{}'",
            registry.name
        )));
    }
    Ok(())
}

/// GET a JSON document from the registry with the user's token.
pub async fn get_json(
    http: &reqwest::Client,
    url: &str,
    identity: &OAuthIdentity,
) -> AppResult<JsonValue> {
    debug!(url = %url, "Querying workflow registry");

    let response = http
        .get(url)
        .bearer_auth(identity.access_token.expose_secret())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| AppError::Registry(format!("Failed to reach {}: {}", url, e)))?;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::Unauthorized(format!(
            "Registry rejected the access token ({})",
            response.status()
        ))),
        StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("Registry resource {}", url))),
        status if !status.is_success() => Err(AppError::Registry(format!(
            "Registry returned {} for {}",
            status, url
        ))),
        _ => response
            .json()
            .await
            .map_err(|e| AppError::Registry(format!("Invalid registry response: {}", e))),
    }
}

type ClientConstructor =
    Arc<dyn Fn(WorkflowRegistry, reqwest::Client) -> Arc<dyn RegistryClient> + Send + Sync>;

/// Maps registry type tags to client constructors.
#[derive(Clone)]
pub struct RegistryClientFactory {
    http: reqwest::Client,
    constructors: HashMap<String, ClientConstructor>,
}

impl RegistryClientFactory {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            constructors: HashMap::new(),
        }
    }

    /// Factory with every built-in client registered.
    pub fn with_defaults(http: reqwest::Client) -> Self {
        let mut factory = Self::new(http);
        factory.register(seek::REGISTRY_TYPE, |registry, http| {
            Arc::new(SeekClient::new(registry, http)) as Arc<dyn RegistryClient>
        });
        factory
    }

    pub fn register<F>(&mut self, registry_type: &str, constructor: F)
    where
        F: Fn(WorkflowRegistry, reqwest::Client) -> Arc<dyn RegistryClient> + Send + Sync + 'static,
    {
        self.constructors
            .insert(registry_type.to_lowercase(), Arc::new(constructor));
    }

    pub fn is_supported(&self, registry_type: &str) -> bool {
        self.constructors
            .contains_key(&registry_type.to_lowercase())
    }

    /// Build the client for `registry`. Unknown types are a configuration error.
    pub fn create(&self, registry: &WorkflowRegistry) -> AppResult<Arc<dyn RegistryClient>> {
        let constructor = self
            .constructors
            .get(&registry.registry_type.to_lowercase())
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "Unsupported registry type '{}' for registry '{}'",
                    registry.registry_type, registry.name
                ))
            })?;
        Ok(constructor(registry.clone(), self.http.clone()))
    }
}

impl std::fmt::Debug for RegistryClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.constructors.keys().collect();
        types.sort();
        f.debug_struct("RegistryClientFactory")
            .field("supported", &types)
            .finish()
    }
}
