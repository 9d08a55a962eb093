//! Shared helpers: in-memory database, configured facade, test app, fixtures.

use actix_web::{App, dev::ServiceResponse, test, web};
use lifemonitor::config::{Config, DatabaseSettings, Environment, HttpClientSettings};
use lifemonitor::db::DbPool;
use lifemonitor::models::{User, WorkflowRegistry, WorkflowSubmission};
use lifemonitor::services::{LifeMonitor, api_key};
use lifemonitor::db::users;
use sea_orm::{ConnectOptions, Database};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::time::Duration;
use uuid::Uuid;

use super::mock_jenkins::MockJenkins;
use super::mock_registry::{MockRegistry, MockWorkflow, crate_archive};

pub const SQLITE_MEMORY: &str = "sqlite::memory:";

pub fn test_config() -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseSettings {
            url: SQLITE_MEMORY.to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        http: HttpClientSettings {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        },
        build_cache_ttl: Duration::ZERO,
        max_crate_size: 1024 * 1024,
        max_listed_builds: 3,
    }
}

/// A fresh, migrated in-memory database.
///
/// One connection only: every SQLite memory connection is its own database.
pub async fn create_test_pool() -> DbPool {
    let mut options = ConnectOptions::new(SQLITE_MEMORY);
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");

    let pool = DbPool::from_connection(conn);
    pool.run_migrations().await.expect("Failed to run migrations");
    pool
}

pub fn create_monitor(pool: &DbPool) -> LifeMonitor {
    LifeMonitor::new(pool.clone(), &test_config()).expect("Failed to build LifeMonitor")
}

pub async fn create_test_app(
    pool: &DbPool,
    monitor: &LifeMonitor,
) -> impl actix_web::dev::Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(monitor.clone()))
            .service(web::scope("/api/v1").configure(lifemonitor::api::configure_api)),
    )
    .await
}

/// Create a user and return it with its API key.
pub async fn create_user(pool: &DbPool, prefix: &str) -> (User, String) {
    let username = format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8]);
    let (key, hash) = api_key::generate_key();
    let user = users::insert(pool.connection(), &username, &hash)
        .await
        .expect("Failed to create user");
    (user, key)
}

pub async fn add_seek_registry(monitor: &LifeMonitor, registry: &MockRegistry) -> WorkflowRegistry {
    monitor
        .add_registry(
            "seek",
            &format!("seek-{}", &Uuid::new_v4().simple().to_string()[..8]),
            &registry.uri,
            "lifemonitor",
            &SecretString::from("client-secret".to_string()),
        )
        .await
        .expect("Failed to add registry")
}

pub async fn link(monitor: &LifeMonitor, user: &User, registry: &WorkflowRegistry, token: &str) {
    monitor
        .link_identity(user, registry, "1", &SecretString::from(token.to_string()))
        .await
        .expect("Failed to link identity");
}

/// One test with one Jenkins instance per job.
pub fn jenkins_definition(jenkins_url: &str, jobs: &[&str]) -> Value {
    let instances: Vec<Value> = jobs
        .iter()
        .map(|job| json!({"service": {"type": "jenkins", "url": jenkins_url, "resource": format!("job/{}", job)}}))
        .collect();
    json!({"test": [{"name": "test1", "specification": {"engine": "planemo"}, "instance": instances}]})
}

/// Publish a workflow on the registry, visible to `token`.
pub fn publish(
    registry: &MockRegistry,
    token: &str,
    id: &str,
    title: &str,
    definition: Option<&Value>,
) -> MockWorkflow {
    let workflow = MockWorkflow {
        id: id.to_string(),
        uuid: Uuid::new_v4(),
        title: title.to_string(),
        version: "1".to_string(),
        public: false,
        archive: crate_archive(title, definition),
    };
    registry.add_workflow(workflow.clone());
    registry.grant(token, id);
    workflow
}

pub fn submission(registry: &WorkflowRegistry, workflow: &MockWorkflow) -> WorkflowSubmission {
    WorkflowSubmission {
        registry_id: registry.id,
        uuid: workflow.uuid,
        version: workflow.version.clone(),
        roc_link: None,
        name: None,
        external_id: None,
    }
}

/// Everything a registration scenario needs.
pub struct Fixture {
    pub pool: DbPool,
    pub monitor: LifeMonitor,
    pub jenkins: MockJenkins,
    pub seek: MockRegistry,
    pub registry: WorkflowRegistry,
    pub user: User,
    pub api_key: String,
    pub token: String,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = create_test_pool().await;
        let monitor = create_monitor(&pool);
        let jenkins = MockJenkins::start().await;
        let seek = MockRegistry::start().await;
        let registry = add_seek_registry(&monitor, &seek).await;
        let (user, api_key) = create_user(&pool, "alice").await;
        let token = format!("token-{}", Uuid::new_v4());
        link(&monitor, &user, &registry, &token).await;

        Fixture {
            pool,
            monitor,
            jenkins,
            seek,
            registry,
            user,
            api_key,
            token,
        }
    }

    /// Publish a workflow whose crate binds one instance per Jenkins job.
    pub fn publish_with_jobs(&self, id: &str, jobs: &[&str]) -> MockWorkflow {
        let definition = jenkins_definition(&self.jenkins.url, jobs);
        publish(&self.seek, &self.token, id, &format!("workflow-{}", id), Some(&definition))
    }

    pub async fn register(&self, workflow: &MockWorkflow) -> lifemonitor::models::Workflow {
        self.monitor
            .register_workflow(&self.user, submission(&self.registry, workflow))
            .await
            .expect("Failed to register workflow")
    }
}
