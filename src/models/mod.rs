//! Domain models for LifeMonitor.

pub mod health;
pub mod registry;
pub mod test_build;
pub mod test_instance;
pub mod test_suite;
pub mod testing_service;
pub mod user;
pub mod workflow;

// Re-export commonly used types
pub use health::{Health, HealthReport};
pub use registry::{RegistryResponse, WorkflowRef, WorkflowRegistry};
pub use test_build::{BuildResponse, BuildResult, BuildsResponse, TestBuild};
pub use test_instance::{InstanceResponse, TestInstance, TestingServiceResponse};
pub use test_suite::{SuiteResponse, Test, TestSuite};
pub use testing_service::{TestingServiceBinding, TestingServiceToken};
pub use user::{OAuthIdentity, User};
pub use workflow::{Workflow, WorkflowResponse, WorkflowSubmission, WorkflowSummary};

use serde::{Deserialize, Deserializer, de::Error as _};

/// Flags selecting how much detail a workflow/suite/instance envelope carries.
///
/// Given as query flags; a bare `?test_build` counts as set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DetailOptions {
    /// Nest the `test_suite[]` list in workflow envelopes.
    #[serde(default, deserialize_with = "query_flag")]
    pub test_suite: bool,
    /// Include last/successful/failed builds and the recent build list.
    #[serde(default, deserialize_with = "query_flag")]
    pub test_build: bool,
    /// Include console output on every listed build (implies `test_build`).
    #[serde(default, deserialize_with = "query_flag")]
    pub test_output: bool,
}

fn query_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(D::Error::custom(format!("invalid flag value '{}'", other))),
    }
}

impl DetailOptions {
    pub fn with_builds(&self) -> bool {
        self.test_build || self.test_output
    }
}
