//! Registered workflow versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::health::Health;
use super::test_suite::{SuiteResponse, TestSuite};

/// One registered version of a workflow, with its test graph.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: Uuid,
    pub registry_id: Uuid,
    pub submitter_id: Uuid,
    pub uuid: Uuid,
    pub version: String,
    pub name: String,
    pub roc_link: String,
    pub roc_metadata: Option<JsonValue>,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
    pub test_suites: Vec<TestSuite>,
}

impl Workflow {
    /// Default external id used when the registry cannot supply one.
    ///
    /// Not collision-safe across registries; the (registry, external_id)
    /// unique index is the only guarantee.
    pub fn default_external_id(uuid: &Uuid, version: &str) -> String {
        format!("{},{}", uuid, version)
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            uuid: self.uuid,
            version: self.version.clone(),
            name: self.name.clone(),
        }
    }

    /// Total number of test instances across all suites.
    pub fn instance_count(&self) -> usize {
        self.test_suites.iter().map(|s| s.instances.len()).sum()
    }
}

/// Identifying part of a workflow envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSummary {
    pub uuid: Uuid,
    pub version: String,
    pub name: String,
}

/// Workflow envelope.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub uuid: Uuid,
    pub version: String,
    pub name: String,
    pub roc_link: String,
    #[serde(rename = "isHealthy")]
    pub healthy: Health,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_suite: Option<Vec<SuiteResponse>>,
}

/// Request to register one workflow version from a registry.
///
/// Missing fields are resolved through the registry client: the external
/// id and RO-Crate link from the registry, the name from the crate.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSubmission {
    #[serde(rename = "registry")]
    pub registry_id: Uuid,
    pub uuid: Uuid,
    pub version: String,
    #[serde(default)]
    pub roc_link: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}
