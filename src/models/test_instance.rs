//! Test instances: one named test bound to one CI job.

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::health::Health;
use super::test_build::BuildsResponse;
use super::testing_service::TestingServiceBinding;

/// A test instance. Several instances may share a name.
#[derive(Debug, Clone)]
pub struct TestInstance {
    pub id: Uuid,
    pub test_suite_id: Uuid,
    pub name: String,
    /// Declaration order inside the suite
    pub position: i32,
    pub parameters: Option<JsonValue>,
    pub testing_service: TestingServiceBinding,
}

/// Instance envelope.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceResponse {
    pub uuid: Uuid,
    pub test_suite: Uuid,
    pub name: String,
    pub parameters: Option<JsonValue>,
    pub testing_service: TestingServiceResponse,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Testing service part of an instance envelope.
#[derive(Debug, Clone, Serialize)]
pub struct TestingServiceResponse {
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub service_type: String,
    pub testing_service_url: String,
    pub resource: Option<String>,
    pub workflow_healthy: Health,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub builds: Option<BuildsResponse>,
}
