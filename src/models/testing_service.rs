//! Testing service bindings: which CI job backs a test instance.

use secrecy::SecretString;
use uuid::Uuid;

/// Credential pair used against a testing service.
#[derive(Debug, Clone)]
pub struct TestingServiceToken {
    pub key: String,
    pub secret: SecretString,
}

/// Persisted description of one CI job reference.
///
/// `id` is the owning test instance id.
#[derive(Debug, Clone)]
pub struct TestingServiceBinding {
    pub id: Uuid,
    /// Lowercase adapter tag, e.g. `jenkins`
    pub service_type: String,
    pub url: String,
    pub resource: Option<String>,
    pub token: Option<TestingServiceToken>,
}

impl TestingServiceBinding {
    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
