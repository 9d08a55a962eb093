//! The LifeMonitor domain facade.
//!
//! Every operation of the service goes through [`LifeMonitor`]: it owns the
//! database pool and both adapter factories, and acts on behalf of an
//! explicitly passed [`User`]. HTTP handlers and the CLI stay thin.

use futures_util::future::{join_all, try_join_all};
use secrecy::SecretString;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{DbPool, identities, registries, test_suites, workflows};
use crate::error::{AppError, AppResult, TestingServiceError};
use crate::models::{
    BuildResponse, BuildsResponse, DetailOptions, HealthReport, InstanceResponse, OAuthIdentity,
    SuiteResponse, TestBuild, TestInstance, TestSuite, TestingServiceResponse, User, Workflow,
    WorkflowRegistry, WorkflowResponse, WorkflowSubmission, WorkflowSummary,
};
use crate::services::health;
use crate::services::registry::{RegistryClient, RegistryClientFactory};
use crate::services::rocrate::{self, RoCrate};
use crate::services::test_definition;
use crate::services::testing::{AdapterContext, TestingServiceAdapter, TestingServiceFactory};

/// Limits applied by the facade.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub max_crate_size: usize,
    pub max_listed_builds: usize,
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_crate_size: config.max_crate_size,
            max_listed_builds: config.max_listed_builds,
        }
    }
}

#[derive(Clone)]
pub struct LifeMonitor {
    pool: DbPool,
    testing: TestingServiceFactory,
    registries: RegistryClientFactory,
    settings: MonitorSettings,
}

impl LifeMonitor {
    /// Facade with the built-in adapters and registry clients.
    pub fn new(pool: DbPool, config: &Config) -> AppResult<Self> {
        let context = AdapterContext::new(&config.http, config.build_cache_ttl)?;
        let registries = RegistryClientFactory::with_defaults(context.http.clone());
        Ok(Self::with_factories(
            pool,
            TestingServiceFactory::with_defaults(context),
            registries,
            MonitorSettings::from(config),
        ))
    }

    pub fn with_factories(
        pool: DbPool,
        testing: TestingServiceFactory,
        registries: RegistryClientFactory,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            pool,
            testing,
            registries,
            settings,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn testing_services(&self) -> &TestingServiceFactory {
        &self.testing
    }

    pub async fn list_registries(&self) -> AppResult<Vec<WorkflowRegistry>> {
        registries::list_all(self.pool.connection()).await
    }

    pub async fn get_registry(&self, id: Uuid) -> AppResult<WorkflowRegistry> {
        registries::find_by_id(self.pool.connection(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow registry {}", id)))
    }

    pub async fn find_registry_by_name(&self, name: &str) -> AppResult<Option<WorkflowRegistry>> {
        registries::find_by_name(self.pool.connection(), name).await
    }

    pub async fn find_registry_by_uri(&self, uri: &str) -> AppResult<Option<WorkflowRegistry>> {
        registries::find_by_uri(self.pool.connection(), uri).await
    }

    /// Store a new registry. Its type must have a registered client.
    pub async fn add_registry(
        &self,
        registry_type: &str,
        name: &str,
        uri: &str,
        client_id: &str,
        client_secret: &SecretString,
    ) -> AppResult<WorkflowRegistry> {
        if !self.registries.is_supported(registry_type) {
            return Err(AppError::Configuration(format!(
                "Unknown registry type '{}'",
                registry_type
            )));
        }
        if self.find_registry_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("Registry '{}' already exists", name)));
        }
        if self.find_registry_by_uri(uri).await?.is_some() {
            return Err(AppError::Conflict(format!("A registry at {} already exists", uri)));
        }

        let registry = registries::insert(
            self.pool.connection(),
            registries::NewRegistry {
                registry_type: &registry_type.to_lowercase(),
                name,
                uri,
                client_id,
                client_secret,
            },
        )
        .await?;
        info!(registry = %registry.id, name = %registry.name, "Workflow registry added");
        Ok(registry)
    }

    /// Store (or refresh) the user's access token for a registry.
    pub async fn link_identity(
        &self,
        user: &User,
        registry: &WorkflowRegistry,
        provider_user_id: &str,
        access_token: &SecretString,
    ) -> AppResult<OAuthIdentity> {
        let identity = identities::upsert(
            self.pool.connection(),
            user.id,
            registry.id,
            provider_user_id,
            access_token,
        )
        .await?;
        info!(user = %user.username, registry = %registry.name, "Registry identity linked");
        Ok(identity)
    }

    /// The user's identity at `registry`. Checked before any registry call.
    async fn identity(&self, user: &User, registry: &WorkflowRegistry) -> AppResult<OAuthIdentity> {
        identities::find(self.pool.connection(), user.id, registry.id)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!(
                    "User '{}' has no identity linked to registry '{}'",
                    user.username, registry.name
                ))
            })
    }

    /// Registered workflows of `registry_id` that the user can see on the registry.
    pub async fn get_user_workflows(&self, user: &User, registry_id: Uuid) -> AppResult<Vec<Workflow>> {
        let registry = self.get_registry(registry_id).await?;
        let client = self.registries.create(&registry)?;
        let identity = self.identity(user, &registry).await?;

        let visible = client.workflows_for_user(&identity).await?;
        let registered = workflows::list_by_registry(self.pool.connection(), registry.id).await?;
        Ok(registered
            .into_iter()
            .filter(|w| {
                visible
                    .iter()
                    .any(|v| v.external_id == w.external_id || v.uuid == Some(w.uuid))
            })
            .collect())
    }

    /// Registered versions of one workflow, newest first.
    pub async fn get_workflow_versions(&self, registry_id: Uuid, uuid: Uuid) -> AppResult<Vec<WorkflowSummary>> {
        let versions = workflows::list_versions(self.pool.connection(), registry_id, uuid).await?;
        if versions.is_empty() {
            return Err(AppError::NotFound(format!("Workflow {}", uuid)));
        }
        Ok(versions.iter().map(Workflow::summary).collect())
    }

    /// Register a workflow version on behalf of `submitter`.
    ///
    /// The RO-Crate is downloaded with the submitter's registry token; a
    /// rejected token is retried anonymously for public crates. A legacy
    /// test definition found in the crate becomes the first test suite.
    pub async fn register_workflow(&self, submitter: &User, submission: WorkflowSubmission) -> AppResult<Workflow> {
        let registry = self.get_registry(submission.registry_id).await?;
        let client = self.registries.create(&registry)?;
        let identity = self.identity(submitter, &registry).await?;

        if workflows::find(
            self.pool.connection(),
            Some(registry.id),
            submission.uuid,
            &submission.version,
        )
        .await?
        .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Workflow {} version {} is already registered in '{}'",
                submission.uuid, submission.version, registry.name
            )));
        }

        let external_id = match &submission.external_id {
            Some(id) => id.clone(),
            None => client
                .external_id_for(&submission.uuid, &submission.version, &identity)
                .await
                .unwrap_or_else(|e| {
                    warn!(
                        workflow = %submission.uuid,
                        registry = %registry.name,
                        "Cannot resolve external id, using default: {}",
                        e
                    );
                    Workflow::default_external_id(&submission.uuid, &submission.version)
                }),
        };
        let roc_link = submission
            .roc_link
            .clone()
            .unwrap_or_else(|| client.build_readonly_link(&external_id, &submission.version));

        let archive = self.download_crate(client.as_ref(), &roc_link, &identity).await?;
        let ro_crate = rocrate::load(archive).await?;

        self.store_workflow(submitter, &registry, submission, external_id, roc_link, ro_crate)
            .await
    }

    async fn download_crate(
        &self,
        client: &dyn RegistryClient,
        url: &str,
        identity: &OAuthIdentity,
    ) -> AppResult<Vec<u8>> {
        let max_size = self.settings.max_crate_size;
        match client.download_with_user_credentials(url, identity, max_size).await {
            Err(AppError::Unauthorized(reason)) => {
                debug!(url = %url, "Token rejected, retrying RO-Crate download anonymously");
                rocrate::download(client.http(), url, None, max_size)
                    .await
                    .map_err(|e| match e {
                        AppError::Unauthorized(_) => AppError::Unauthorized(reason),
                        other => other,
                    })
            }
            result => result,
        }
    }

    async fn store_workflow(
        &self,
        submitter: &User,
        registry: &WorkflowRegistry,
        submission: WorkflowSubmission,
        external_id: String,
        roc_link: String,
        ro_crate: RoCrate,
    ) -> AppResult<Workflow> {
        let id = Uuid::new_v4();
        let name = submission
            .name
            .or(ro_crate.name)
            .unwrap_or_else(|| submission.uuid.to_string());

        let mut test_suites = Vec::new();
        if let Some(definition) = ro_crate.test_definition {
            test_suites.push(test_definition::build_suite(
                id,
                submitter.id,
                definition,
                &self.testing,
            )?);
        }

        let workflow = Workflow {
            id,
            registry_id: registry.id,
            submitter_id: submitter.id,
            uuid: submission.uuid,
            version: submission.version,
            name,
            roc_link,
            roc_metadata: Some(ro_crate.metadata),
            external_id,
            created_at: chrono::Utc::now(),
            test_suites,
        };
        workflows::insert_graph(self.pool.connection(), &workflow).await?;

        info!(
            workflow = %workflow.uuid,
            version = %workflow.version,
            registry = %registry.name,
            submitter = %submitter.username,
            suites = workflow.test_suites.len(),
            instances = workflow.instance_count(),
            "Workflow registered"
        );
        Ok(workflow)
    }

    /// A registered workflow version. Without `registry`, (uuid, version)
    /// must be registered in a single registry.
    async fn find_workflow(&self, registry: Option<Uuid>, uuid: Uuid, version: &str) -> AppResult<Workflow> {
        let registry = match registry {
            Some(id) => Some(id),
            None => {
                let found = workflows::registries_of(self.pool.connection(), uuid, version).await?;
                if found.len() > 1 {
                    return Err(AppError::InvalidInput(format!(
                        "Workflow {} version {} is registered in {} registries; select one with 'registry'",
                        uuid,
                        version,
                        found.len()
                    )));
                }
                found.into_iter().next()
            }
        };

        match registry {
            Some(id) => workflows::find(self.pool.connection(), Some(id), uuid, version).await?,
            None => None,
        }
        .ok_or_else(|| AppError::NotFound(format!("Workflow {} version {}", uuid, version)))
    }

    /// Remove a workflow version and its whole test graph. Submitter only.
    pub async fn deregister_workflow(
        &self,
        user: &User,
        registry: Option<Uuid>,
        uuid: Uuid,
        version: &str,
    ) -> AppResult<()> {
        let workflow = self.find_workflow(registry, uuid, version).await?;
        if workflow.submitter_id != user.id {
            return Err(AppError::Forbidden(format!(
                "Workflow {} version {} was not submitted by '{}'",
                uuid, version, user.username
            )));
        }

        if !workflows::delete_graph(self.pool.connection(), workflow.id).await? {
            return Err(AppError::NotFound(format!("Workflow {} version {}", uuid, version)));
        }
        info!(workflow = %uuid, version = %version, user = %user.username, "Workflow deregistered");
        Ok(())
    }

    /// Attach a new suite built from `definition` to a workflow version.
    pub async fn register_test_suite(
        &self,
        user: &User,
        registry: Option<Uuid>,
        uuid: Uuid,
        version: &str,
        definition: JsonValue,
    ) -> AppResult<TestSuite> {
        let workflow = self.find_workflow(registry, uuid, version).await?;
        if workflow.submitter_id != user.id {
            return Err(AppError::Forbidden(format!(
                "Workflow {} version {} was not submitted by '{}'",
                uuid, version, user.username
            )));
        }

        let suite = test_definition::build_suite(workflow.id, user.id, definition, &self.testing)?;
        test_suites::insert(self.pool.connection(), &suite).await?;
        info!(
            suite = %suite.id,
            workflow = %uuid,
            version = %version,
            instances = suite.instances.len(),
            "Test suite registered"
        );
        Ok(suite)
    }

    pub async fn get_test_suite(&self, suite_id: Uuid) -> AppResult<TestSuite> {
        test_suites::find_by_id(self.pool.connection(), suite_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test suite {}", suite_id)))
    }

    /// Remove a suite with its instances. Suite submitter only.
    pub async fn deregister_test_suite(&self, user: &User, suite_id: Uuid) -> AppResult<()> {
        let suite = self.get_test_suite(suite_id).await?;
        if suite.submitter_id != user.id {
            return Err(AppError::Forbidden(format!(
                "Test suite {} was not submitted by '{}'",
                suite_id, user.username
            )));
        }

        if !test_suites::delete(self.pool.connection(), suite_id).await? {
            return Err(AppError::NotFound(format!("Test suite {}", suite_id)));
        }
        info!(suite = %suite_id, user = %user.username, "Test suite deregistered");
        Ok(())
    }

    pub async fn get_test_instance(&self, instance_id: Uuid) -> AppResult<TestInstance> {
        test_suites::find_instance(self.pool.connection(), instance_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test instance {}", instance_id)))
    }

    /// Health of a workflow version, optionally with its suites and builds.
    pub async fn workflow_response(
        &self,
        registry: Option<Uuid>,
        uuid: Uuid,
        version: &str,
        options: DetailOptions,
    ) -> AppResult<WorkflowResponse> {
        let workflow = self.find_workflow(registry, uuid, version).await?;

        let mut suite_reports = Vec::with_capacity(workflow.test_suites.len());
        let mut suites = Vec::with_capacity(workflow.test_suites.len());
        for suite in &workflow.test_suites {
            let (report, response) = self.suite_envelope(suite, None, options).await;
            suite_reports.push(report);
            suites.push(response);
        }
        let report = HealthReport::rollup(suite_reports);

        Ok(WorkflowResponse {
            uuid: workflow.uuid,
            version: workflow.version,
            name: workflow.name,
            roc_link: workflow.roc_link,
            healthy: report.healthy,
            issues: report.issues,
            test_suite: options.test_suite.then_some(suites),
        })
    }

    pub async fn suite_response(&self, suite_id: Uuid, options: DetailOptions) -> AppResult<SuiteResponse> {
        let suite = self.get_test_suite(suite_id).await?;
        let workflow = workflows::find_by_id(self.pool.connection(), suite.workflow_id)
            .await?
            .map(|w| w.summary());
        let (_, response) = self.suite_envelope(&suite, workflow, options).await;
        Ok(response)
    }

    pub async fn instance_response(&self, instance_id: Uuid, options: DetailOptions) -> AppResult<InstanceResponse> {
        let instance = self.get_test_instance(instance_id).await?;
        let report = health::instance_health(&self.testing, &instance).await;
        Ok(self.instance_envelope(&instance, report, options).await)
    }

    async fn suite_envelope(
        &self,
        suite: &TestSuite,
        workflow: Option<WorkflowSummary>,
        options: DetailOptions,
    ) -> (HealthReport, SuiteResponse) {
        let reports = health::instance_reports(&self.testing, suite).await;
        let report = HealthReport::rollup(reports.iter().cloned());
        let test = join_all(
            suite
                .instances
                .iter()
                .zip(reports)
                .map(|(instance, r)| self.instance_envelope(instance, r, options)),
        )
        .await;

        let response = SuiteResponse {
            uuid: suite.id,
            workflow,
            healthy: report.healthy,
            issues: report.issues.clone(),
            test,
        };
        (report, response)
    }

    /// Envelope of one instance. Build details that cannot be fetched are
    /// reported as instance issues instead of failing the whole envelope.
    async fn instance_envelope(
        &self,
        instance: &TestInstance,
        report: HealthReport,
        options: DetailOptions,
    ) -> InstanceResponse {
        let binding = &instance.testing_service;
        let mut issues = report.issues;

        let builds = if options.with_builds() {
            let fetched = match self.testing.create(binding) {
                Ok(adapter) => self
                    .builds(adapter.as_ref(), options.test_output)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match fetched {
                Ok(builds) => Some(builds),
                Err(message) => {
                    warn!(instance = %instance.id, "Cannot fetch test builds: {}", message);
                    if !issues.contains(&message) {
                        issues.push(message);
                    }
                    None
                }
            }
        } else {
            None
        };

        InstanceResponse {
            uuid: instance.id,
            test_suite: instance.test_suite_id,
            name: instance.name.clone(),
            parameters: instance.parameters.clone(),
            testing_service: TestingServiceResponse {
                uuid: binding.id,
                service_type: binding.service_type.clone(),
                testing_service_url: binding.url.clone(),
                resource: binding.resource.clone(),
                workflow_healthy: report.healthy,
                builds,
            },
            issues,
        }
    }

    async fn builds(
        &self,
        adapter: &dyn TestingServiceAdapter,
        with_output: bool,
    ) -> Result<BuildsResponse, TestingServiceError> {
        let (last, successful, failed, recent) = tokio::try_join!(
            adapter.last_build(),
            adapter.last_successful_build(),
            adapter.last_failed_build(),
            adapter.recent_builds(self.settings.max_listed_builds),
        )?;

        Ok(BuildsResponse {
            last_test_build: optional_build_response(adapter, last, with_output).await?,
            last_successful_test_build: optional_build_response(adapter, successful, with_output).await?,
            last_failed_test_build: optional_build_response(adapter, failed, with_output).await?,
            test_builds: try_join_all(recent.iter().map(|b| build_response(adapter, b, with_output))).await?,
        })
    }
}

async fn build_response(
    adapter: &dyn TestingServiceAdapter,
    build: &TestBuild,
    with_output: bool,
) -> Result<BuildResponse, TestingServiceError> {
    let output = if with_output {
        Some(adapter.build_output(build.number).await?)
    } else {
        None
    };
    Ok(build.to_response(output))
}

async fn optional_build_response(
    adapter: &dyn TestingServiceAdapter,
    build: Option<TestBuild>,
    with_output: bool,
) -> Result<Option<BuildResponse>, TestingServiceError> {
    match build {
        Some(b) => build_response(adapter, &b, with_output).await.map(Some),
        None => Ok(None),
    }
}

impl std::fmt::Debug for LifeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifeMonitor")
            .field("testing", &self.testing)
            .field("settings", &self.settings)
            .finish()
    }
}
