//! E2E tests: workflow and test suite registration against the mock registry.

use lifemonitor::db::{registries, workflows};
use lifemonitor::error::AppError;
use lifemonitor::models::Workflow;
use secrecy::SecretString;
use serde_json::json;

use super::mock_registry::{MockWorkflow, crate_archive};
use super::test_helpers::*;

#[actix_rt::test]
async fn test_register_workflow_with_legacy_test_definition() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("17", &["wf-a"]);

    let workflow = fx.register(&published).await;

    assert_eq!(workflow.uuid, published.uuid);
    assert_eq!(workflow.name, "workflow-17");
    assert_eq!(workflow.external_id, "17");
    assert_eq!(workflow.roc_link, fx.seek.crate_link("17", "1"));
    assert_eq!(workflow.submitter_id, fx.user.id);
    assert_eq!(workflow.test_suites.len(), 1);
    assert_eq!(workflow.instance_count(), 1);

    let stored = workflows::find(fx.pool.connection(), Some(fx.registry.id), published.uuid, "1")
        .await
        .unwrap()
        .expect("workflow must be stored");
    assert!(stored.roc_metadata.is_some());
    let suite = &stored.test_suites[0];
    assert_eq!(suite.tests().unwrap()[0].name, "test1");
    assert_eq!(suite.instances[0].testing_service.resource.as_deref(), Some("job/wf-a"));

    let counts = workflows::graph_counts(fx.pool.connection()).await.unwrap();
    assert_eq!((counts.workflows, counts.test_suites, counts.test_instances, counts.testing_services), (1, 1, 1, 1));
}

#[actix_rt::test]
async fn test_register_workflow_without_test_definition() {
    let fx = Fixture::new().await;
    let published = super::test_helpers::publish(&fx.seek, &fx.token, "3", "no-tests", None);

    let workflow = fx.register(&published).await;
    assert!(workflow.test_suites.is_empty());
    assert_eq!(workflow.name, "no-tests");
}

#[actix_rt::test]
async fn test_register_workflow_with_empty_instance_list() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("4", &[]);

    let workflow = fx.register(&published).await;
    assert_eq!(workflow.test_suites.len(), 1);
    assert_eq!(workflow.instance_count(), 0);
}

#[actix_rt::test]
async fn test_explicit_fields_override_registry_lookups() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("5", &["wf"]);

    let mut sub = submission(&fx.registry, &published);
    sub.name = Some("custom".to_string());
    sub.external_id = Some("ext-5".to_string());
    sub.roc_link = Some(fx.seek.crate_link("5", "1"));
    let workflow = fx.monitor.register_workflow(&fx.user, sub).await.unwrap();

    assert_eq!(workflow.name, "custom");
    assert_eq!(workflow.external_id, "ext-5");
}

#[actix_rt::test]
async fn test_missing_identity_fails_before_any_registry_call() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("6", &["wf"]);
    let (stranger, _) = create_user(&fx.pool, "bob").await;

    let result = fx
        .monitor
        .register_workflow(&stranger, submission(&fx.registry, &published))
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))), "{:?}", result);
    assert_eq!(fx.seek.requests(), 0);
}

#[actix_rt::test]
async fn test_private_crate_not_visible_to_user_is_unauthorized() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("7", &["wf"]);
    let (other, _) = create_user(&fx.pool, "carol").await;
    link(&fx.monitor, &other, &fx.registry, "token-without-grants").await;

    let mut sub = submission(&fx.registry, &published);
    sub.roc_link = Some(fx.seek.crate_link("7", "1"));
    let result = fx.monitor.register_workflow(&other, sub).await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))), "{:?}", result);
    assert_eq!(workflows::count(fx.pool.connection()).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_public_crate_is_fetched_anonymously_when_token_is_rejected() {
    let fx = Fixture::new().await;
    let definition = jenkins_definition(&fx.jenkins.url, &["wf"]);
    let public = MockWorkflow {
        id: "8".to_string(),
        uuid: uuid::Uuid::new_v4(),
        title: "public-wf".to_string(),
        version: "1".to_string(),
        public: true,
        archive: crate_archive("public-wf", Some(&definition)),
    };
    fx.seek.add_workflow(public.clone());
    let (other, _) = create_user(&fx.pool, "dave").await;
    link(&fx.monitor, &other, &fx.registry, "token-without-grants").await;

    let mut sub = submission(&fx.registry, &public);
    sub.roc_link = Some(fx.seek.crate_link("8", "1"));
    let workflow = fx.monitor.register_workflow(&other, sub).await.unwrap();

    assert_eq!(workflow.name, "public-wf");
    // the registry could not map the uuid for this user
    assert_eq!(workflow.external_id, Workflow::default_external_id(&public.uuid, "1"));
}

#[actix_rt::test]
async fn test_duplicate_registration_is_a_conflict() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("9", &["wf"]);
    fx.register(&published).await;

    let again = fx
        .monitor
        .register_workflow(&fx.user, submission(&fx.registry, &published))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))), "{:?}", again);
}

#[actix_rt::test]
async fn test_unsupported_service_in_crate_aborts_registration() {
    let fx = Fixture::new().await;
    let definition = json!({"test": [{"name": "t", "instance": [
        {"service": {"type": "travis", "url": "https://travis.example.org", "resource": "repo"}}
    ]}]});
    let published = super::test_helpers::publish(&fx.seek, &fx.token, "10", "travis-wf", Some(&definition));

    let result = fx
        .monitor
        .register_workflow(&fx.user, submission(&fx.registry, &published))
        .await;
    assert!(matches!(result, Err(AppError::TestingServiceNotSupported(_))), "{:?}", result);
    assert_eq!(workflows::graph_counts(fx.pool.connection()).await.unwrap(), Default::default());
}

#[actix_rt::test]
async fn test_unknown_registry_type_is_a_configuration_error() {
    let fx = Fixture::new().await;
    let stored = registries::insert(
        fx.pool.connection(),
        registries::NewRegistry {
            registry_type: "workflowhub-next",
            name: "future",
            uri: "https://future.example.org",
            client_id: "lm",
            client_secret: &SecretString::from("x".to_string()),
        },
    )
    .await
    .unwrap();
    let published = fx.publish_with_jobs("11", &["wf"]);

    let result = fx
        .monitor
        .register_workflow(&fx.user, submission(&stored, &published))
        .await;
    assert!(matches!(result, Err(AppError::Configuration(_))), "{:?}", result);
}

#[actix_rt::test]
async fn test_add_registry_validates_type_and_uniqueness() {
    let fx = Fixture::new().await;
    let secret = SecretString::from("x".to_string());

    let unknown = fx.monitor.add_registry("nope", "other", "https://other.example.org", "lm", &secret).await;
    assert!(matches!(unknown, Err(AppError::Configuration(_))));

    let same_name = fx.monitor.add_registry("seek", &fx.registry.name, "https://other.example.org", "lm", &secret).await;
    assert!(matches!(same_name, Err(AppError::Conflict(_))));

    let same_uri = fx.monitor.add_registry("SEEK", "other", &fx.seek.uri, "lm", &secret).await;
    assert!(matches!(same_uri, Err(AppError::Conflict(_))));
}

#[actix_rt::test]
async fn test_register_then_deregister_leaves_no_orphans() {
    let fx = Fixture::new().await;
    let kept = fx.publish_with_jobs("12", &["a"]);
    fx.register(&kept).await;
    let before = workflows::graph_counts(fx.pool.connection()).await.unwrap();

    let published = fx.publish_with_jobs("13", &["b", "c"]);
    fx.register(&published).await;
    fx.monitor
        .register_test_suite(&fx.user, None, published.uuid, "1", jenkins_definition(&fx.jenkins.url, &["d"]))
        .await
        .unwrap();

    fx.monitor
        .deregister_workflow(&fx.user, None, published.uuid, "1")
        .await
        .unwrap();

    assert_eq!(workflows::graph_counts(fx.pool.connection()).await.unwrap(), before);
    let missing = fx.monitor.deregister_workflow(&fx.user, None, published.uuid, "1").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[actix_rt::test]
async fn test_only_the_submitter_may_deregister() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("14", &["a"]);
    fx.register(&published).await;
    let (other, _) = create_user(&fx.pool, "eve").await;

    let result = fx.monitor.deregister_workflow(&other, None, published.uuid, "1").await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(workflows::count(fx.pool.connection()).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_register_and_deregister_test_suite() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("15", &["a"]);
    fx.register(&published).await;

    let suite = fx
        .monitor
        .register_test_suite(&fx.user, None, published.uuid, "1", jenkins_definition(&fx.jenkins.url, &["x", "y"]))
        .await
        .unwrap();
    assert_eq!(suite.instances.len(), 2);
    let tests = suite.tests().unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(suite.instances_for(&tests[0]).len(), 2);
    assert_eq!(suite.instances_by_name("test1").count(), 2);
    assert_eq!(suite.instances_by_name("missing").count(), 0);

    let stored = fx.monitor.get_test_suite(suite.id).await.unwrap();
    let resources: Vec<_> = stored
        .instances
        .iter()
        .map(|i| i.testing_service.resource.clone().unwrap())
        .collect();
    assert_eq!(resources, vec!["job/x", "job/y"]);

    fx.monitor.deregister_test_suite(&fx.user, suite.id).await.unwrap();
    let gone = fx.monitor.get_test_suite(suite.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    assert!(matches!(
        fx.monitor.deregister_test_suite(&fx.user, suite.id).await,
        Err(AppError::NotFound(_))
    ));

    let counts = workflows::graph_counts(fx.pool.connection()).await.unwrap();
    assert_eq!((counts.test_suites, counts.test_instances, counts.testing_services), (1, 1, 1));
}

#[actix_rt::test]
async fn test_invalid_test_suites_are_not_persisted() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("16", &["a"]);
    fx.register(&published).await;
    let before = workflows::graph_counts(fx.pool.connection()).await.unwrap();

    let missing_url = json!({"test": [{"name": "t", "instance": [{"service": {"type": "jenkins"}}]}]});
    let result = fx.monitor.register_test_suite(&fx.user, None, published.uuid, "1", missing_url).await;
    assert!(matches!(result, Err(AppError::SpecificationNotValid(_))), "{:?}", result);

    let unsupported = json!({"test": [{"name": "t", "instance": [{"service": {"type": "github", "url": "https://x"}}]}]});
    let result = fx.monitor.register_test_suite(&fx.user, None, published.uuid, "1", unsupported).await;
    assert!(matches!(result, Err(AppError::TestingServiceNotSupported(_))), "{:?}", result);

    let unknown_workflow = fx
        .monitor
        .register_test_suite(&fx.user, None, uuid::Uuid::new_v4(), "1", jenkins_definition(&fx.jenkins.url, &["a"]))
        .await;
    assert!(matches!(unknown_workflow, Err(AppError::NotFound(_))));

    assert_eq!(workflows::graph_counts(fx.pool.connection()).await.unwrap(), before);
}

#[actix_rt::test]
async fn test_user_workflows_and_versions() {
    let fx = Fixture::new().await;
    let visible = fx.publish_with_jobs("18", &["a"]);
    fx.register(&visible).await;

    let mut v2 = submission(&fx.registry, &visible);
    v2.version = "2".to_string();
    v2.roc_link = Some(fx.seek.crate_link("18", "2"));
    fx.monitor.register_workflow(&fx.user, v2).await.unwrap();

    // registered by someone else, hidden from this user on the registry
    let hidden = super::test_helpers::publish(&fx.seek, "other-token", "19", "hidden", None);
    let (other, _) = create_user(&fx.pool, "frank").await;
    link(&fx.monitor, &other, &fx.registry, "other-token").await;
    fx.monitor
        .register_workflow(&other, submission(&fx.registry, &hidden))
        .await
        .unwrap();

    let mine = fx.monitor.get_user_workflows(&fx.user, fx.registry.id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|w| w.uuid == visible.uuid));

    let versions = fx.monitor.get_workflow_versions(fx.registry.id, visible.uuid).await.unwrap();
    assert_eq!(versions.iter().map(|v| v.version.as_str()).collect::<Vec<_>>(), vec!["2", "1"]);

    let (stranger, _) = create_user(&fx.pool, "gina").await;
    assert!(matches!(
        fx.monitor.get_user_workflows(&stranger, fx.registry.id).await,
        Err(AppError::Unauthorized(_))
    ));
}

#[actix_rt::test]
async fn test_inserting_a_registered_graph_twice_is_a_conflict() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("40", &["a"]);
    let workflow = fx.register(&published).await;
    let before = workflows::graph_counts(fx.pool.connection()).await.unwrap();

    let again = workflows::insert_graph(fx.pool.connection(), &workflow).await;
    assert!(matches!(again, Err(AppError::Conflict(_))), "{:?}", again);

    // a fresh row id still collides on (registry, uuid, version)
    let mut copy = workflow.clone();
    copy.id = uuid::Uuid::new_v4();
    copy.test_suites.clear();
    let again = workflows::insert_graph(fx.pool.connection(), &copy).await;
    assert!(matches!(again, Err(AppError::Conflict(_))), "{:?}", again);

    assert_eq!(workflows::graph_counts(fx.pool.connection()).await.unwrap(), before);
}

#[actix_rt::test]
async fn test_graph_reads_run_in_one_transaction_on_a_single_connection() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("41", &["a", "b"]);
    let workflow = fx.register(&published).await;
    let suite_id = workflow.test_suites[0].id;

    let by_id = workflows::find_by_id(fx.pool.connection(), workflow.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_id.test_suites.len(), 1);
    assert_eq!(by_id.instance_count(), 2);

    let suite = lifemonitor::db::test_suites::find_by_id(fx.pool.connection(), suite_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(suite.instances.len(), 2);

    fx.monitor
        .deregister_workflow(&fx.user, None, published.uuid, "1")
        .await
        .unwrap();
    assert!(workflows::find_by_id(fx.pool.connection(), workflow.id).await.unwrap().is_none());
    assert!(lifemonitor::db::test_suites::find_by_id(fx.pool.connection(), suite_id)
        .await
        .unwrap()
        .is_none());
}

#[actix_rt::test]
async fn test_same_version_in_two_registries_is_selected_by_registry() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("42", &["a"]);
    fx.register(&published).await;

    let mirror = super::mock_registry::MockRegistry::start().await;
    let mirror_registry = add_seek_registry(&fx.monitor, &mirror).await;
    let mirrored = MockWorkflow {
        id: "7042".to_string(),
        ..published.clone()
    };
    mirror.add_workflow(mirrored.clone());
    mirror.grant("mirror-token", "7042");
    let (other, _) = create_user(&fx.pool, "henry").await;
    link(&fx.monitor, &other, &mirror_registry, "mirror-token").await;
    let copy = fx
        .monitor
        .register_workflow(&other, submission(&mirror_registry, &mirrored))
        .await
        .unwrap();
    assert_eq!(copy.external_id, "7042");

    let ambiguous = fx.monitor.deregister_workflow(&other, None, published.uuid, "1").await;
    assert!(matches!(ambiguous, Err(AppError::InvalidInput(_))), "{:?}", ambiguous);
    assert!(matches!(
        fx.monitor
            .workflow_response(None, published.uuid, "1", Default::default())
            .await,
        Err(AppError::InvalidInput(_))
    ));

    let wrong_owner = fx
        .monitor
        .deregister_workflow(&other, Some(fx.registry.id), published.uuid, "1")
        .await;
    assert!(matches!(wrong_owner, Err(AppError::Forbidden(_))));

    fx.monitor
        .deregister_workflow(&other, Some(mirror_registry.id), published.uuid, "1")
        .await
        .unwrap();

    // only one registration left, so the registry is optional again
    let remaining = fx
        .monitor
        .workflow_response(None, published.uuid, "1", Default::default())
        .await
        .unwrap();
    assert_eq!(remaining.name, "workflow-42");
    fx.monitor
        .deregister_workflow(&fx.user, None, published.uuid, "1")
        .await
        .unwrap();
}
