//! Testing service adapters.
//!
//! Every CI backend is reached through [`TestingServiceAdapter`]. Adapters
//! are built by [`TestingServiceFactory`] from a persisted binding; the
//! factory maps a lowercase type tag to a constructor and is populated at
//! startup, so unknown tags are rejected while a test definition is parsed.

mod cache;
pub mod jenkins;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::HttpClientSettings;
use crate::error::{AppError, AppResult, TestingServiceError};
use crate::models::{TestBuild, TestingServiceBinding};

pub use cache::MetadataCache;
pub use jenkins::JenkinsAdapter;

/// Uniform query interface over one CI job.
///
/// Every method is a live query (modulo the metadata cache); transport and
/// backend failures surface as [`TestingServiceError`].
#[async_trait]
pub trait TestingServiceAdapter: Send + Sync {
    fn binding(&self) -> &TestingServiceBinding;

    async fn last_build(&self) -> Result<Option<TestBuild>, TestingServiceError>;

    async fn last_successful_build(&self) -> Result<Option<TestBuild>, TestingServiceError>;

    async fn last_failed_build(&self) -> Result<Option<TestBuild>, TestingServiceError>;

    /// All builds known to the backend, newest first.
    async fn list_builds(&self) -> Result<Vec<TestBuild>, TestingServiceError>;

    async fn build(&self, number: i64) -> Result<TestBuild, TestingServiceError>;

    async fn build_output(&self, number: i64) -> Result<String, TestingServiceError>;

    /// At most `limit` builds, newest first.
    async fn recent_builds(&self, limit: usize) -> Result<Vec<TestBuild>, TestingServiceError> {
        let mut builds = self.list_builds().await?;
        builds.truncate(limit);
        Ok(builds)
    }
}

/// Shared resources handed to adapter constructors.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub http: reqwest::Client,
    pub cache: MetadataCache,
}

impl AdapterContext {
    pub fn new(settings: &HttpClientSettings, cache_ttl: Duration) -> AppResult<Self> {
        let http = settings.build_client().map_err(|e| {
            AppError::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self {
            http,
            cache: MetadataCache::new(cache_ttl),
        })
    }
}

type AdapterConstructor = Arc<
    dyn Fn(TestingServiceBinding, &AdapterContext) -> Arc<dyn TestingServiceAdapter> + Send + Sync,
>;

/// Maps testing service type tags to adapter constructors.
#[derive(Clone)]
pub struct TestingServiceFactory {
    context: AdapterContext,
    constructors: HashMap<String, AdapterConstructor>,
}

impl TestingServiceFactory {
    /// Empty factory; nothing is supported until registered.
    pub fn new(context: AdapterContext) -> Self {
        Self {
            context,
            constructors: HashMap::new(),
        }
    }

    /// Factory with every built-in adapter registered.
    pub fn with_defaults(context: AdapterContext) -> Self {
        let mut factory = Self::new(context);
        factory.register(jenkins::SERVICE_TYPE, |binding, ctx| {
            Arc::new(JenkinsAdapter::new(binding, ctx)) as Arc<dyn TestingServiceAdapter>
        });
        factory
    }

    /// Register (or replace) the constructor for `service_type`.
    pub fn register<F>(&mut self, service_type: &str, constructor: F)
    where
        F: Fn(TestingServiceBinding, &AdapterContext) -> Arc<dyn TestingServiceAdapter>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(service_type.to_lowercase(), Arc::new(constructor));
    }

    /// Type tags are matched case-insensitively.
    pub fn is_supported(&self, service_type: &str) -> bool {
        self.constructors
            .contains_key(&service_type.to_lowercase())
    }

    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn context(&self) -> &AdapterContext {
        &self.context
    }

    /// Build the adapter for a binding.
    pub fn create(&self, binding: &TestingServiceBinding) -> AppResult<Arc<dyn TestingServiceAdapter>> {
        let constructor = self
            .constructors
            .get(&binding.service_type.to_lowercase())
            .ok_or_else(|| {
                AppError::TestingServiceNotSupported(format!(
                    "'{}' (supported: {})",
                    binding.service_type,
                    self.supported_types().join(", ")
                ))
            })?;
        Ok(constructor(binding.clone(), &self.context))
    }
}

impl std::fmt::Debug for TestingServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestingServiceFactory")
            .field("supported", &self.supported_types())
            .finish()
    }
}
