//! SEEK registry client (JSON:API).
//!
//! Listing: `GET {uri}/workflows?format=json` returns `data[]` entries with
//! an `id`; the per-workflow document `GET {uri}/workflows/{id}?format=json`
//! carries `meta.uuid`, `attributes.title` and `attributes.latest_version`.

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{RegistryClient, ensure_identity, get_json};
use crate::error::{AppError, AppResult};
use crate::models::{OAuthIdentity, Workflow, WorkflowRef, WorkflowRegistry};

/// Type tag stored on registries served by this client.
pub const REGISTRY_TYPE: &str = "seek";

pub struct SeekClient {
    registry: WorkflowRegistry,
    http: reqwest::Client,
}

impl SeekClient {
    pub fn new(registry: WorkflowRegistry, http: reqwest::Client) -> Self {
        Self { registry, http }
    }

    async fn workflow_ids(&self, identity: &OAuthIdentity) -> AppResult<Vec<String>> {
        let url = format!("{}/workflows?format=json", self.registry.base_uri());
        let listing = get_json(&self.http, &url, identity).await?;
        let data = listing
            .get("data")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| AppError::Registry("SEEK listing has no 'data' array".to_string()))?;
        Ok(data.iter().filter_map(entry_id).collect())
    }

    async fn workflow_details(&self, id: &str, identity: &OAuthIdentity) -> AppResult<WorkflowRef> {
        let url = format!(
            "{}/workflows/{}?format=json",
            self.registry.base_uri(),
            urlencoding::encode(id)
        );
        let document = get_json(&self.http, &url, identity).await?;
        document
            .get("data")
            .and_then(parse_workflow)
            .ok_or_else(|| AppError::Registry(format!("Malformed SEEK workflow {}", id)))
    }
}

/// SEEK ids are strings in JSON:API, but some deployments emit numbers.
fn entry_id(entry: &JsonValue) -> Option<String> {
    match entry.get("id")? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode the `data` object of a SEEK workflow document.
pub fn parse_workflow(data: &JsonValue) -> Option<WorkflowRef> {
    let external_id = entry_id(data)?;
    let attributes = data.get("attributes");
    let name = attributes
        .and_then(|a| a.get("title"))
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();
    let uuid = data
        .get("meta")
        .and_then(|m| m.get("uuid"))
        .and_then(JsonValue::as_str)
        .and_then(|u| Uuid::parse_str(u).ok());
    let version = attributes
        .and_then(|a| a.get("latest_version"))
        .and_then(|v| match v {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        });

    Some(WorkflowRef {
        external_id,
        uuid,
        name,
        version,
    })
}

#[async_trait]
impl RegistryClient for SeekClient {
    fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The SEEK id of the visible workflow with this UUID, or the CSV default.
    async fn external_id_for(
        &self,
        uuid: &Uuid,
        version: &str,
        identity: &OAuthIdentity,
    ) -> AppResult<String> {
        let workflows = self.workflows_for_user(identity).await?;
        Ok(workflows
            .into_iter()
            .find(|w| w.uuid.as_ref() == Some(uuid))
            .map(|w| w.external_id)
            .unwrap_or_else(|| Workflow::default_external_id(uuid, version)))
    }

    async fn workflows_for_user(&self, identity: &OAuthIdentity) -> AppResult<Vec<WorkflowRef>> {
        ensure_identity(&self.registry, identity)?;
        let ids = self.workflow_ids(identity).await?;
        try_join_all(ids.iter().map(|id| self.workflow_details(id, identity))).await
    }

    fn build_readonly_link(&self, external_id: &str, version: &str) -> String {
        format!(
            "{}/workflows/{}/ro_crate?version={}",
            self.registry.base_uri(),
            urlencoding::encode(external_id),
            urlencoding::encode(version)
        )
    }
}
