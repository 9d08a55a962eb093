//! Test build snapshots. Never persisted; rebuilt from every adapter response.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Outcome of a CI build. Anything but an explicit success counts as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failed,
}

/// One CI execution of a test instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TestBuild {
    /// Adapter-assigned, monotonic per job
    pub number: i64,
    /// VCS revision pointer, as reported by the backend
    pub revision: Option<JsonValue>,
    pub duration_ms: i64,
    pub result: BuildResult,
    pub url: String,
}

impl TestBuild {
    pub fn is_successful(&self) -> bool {
        self.result == BuildResult::Success
    }

    /// Serializable view, optionally carrying the console output.
    pub fn to_response(&self, output: Option<String>) -> BuildResponse {
        BuildResponse {
            success: self.is_successful(),
            build_number: self.number,
            last_build_revision: self.revision.clone(),
            duration: self.duration_ms,
            url: self.url.clone(),
            output,
        }
    }
}

/// Build entry of an instance envelope.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResponse {
    pub success: bool,
    pub build_number: i64,
    pub last_build_revision: Option<JsonValue>,
    pub duration: i64,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Build details attached to a testing service envelope.
#[derive(Debug, Clone, Serialize)]
pub struct BuildsResponse {
    pub last_test_build: Option<BuildResponse>,
    pub last_successful_test_build: Option<BuildResponse>,
    pub last_failed_test_build: Option<BuildResponse>,
    pub test_builds: Vec<BuildResponse>,
}
