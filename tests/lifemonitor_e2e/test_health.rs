//! E2E tests: health envelopes of registered workflows backed by mock Jenkins.

use lifemonitor::models::{DetailOptions, Health};
use serde_json::json;

use super::test_helpers::*;

fn detail(test_suite: bool, test_build: bool, test_output: bool) -> DetailOptions {
    DetailOptions {
        test_suite,
        test_build,
        test_output,
    }
}

#[actix_rt::test]
async fn test_successful_last_build_is_healthy() {
    let fx = Fixture::new().await;
    fx.jenkins.add_job("green", &[Some("SUCCESS"), Some("FAILURE")]);
    let published = fx.publish_with_jobs("20", &["green"]);
    fx.register(&published).await;

    let response = fx
        .monitor
        .workflow_response(None, published.uuid, "1", DetailOptions::default())
        .await
        .unwrap();

    assert_eq!(response.healthy, Health::Healthy);
    assert!(response.issues.is_empty());
    assert!(response.test_suite.is_none());
    assert_eq!(serde_json::to_value(&response).unwrap()["isHealthy"], json!(true));
}

#[actix_rt::test]
async fn test_failed_last_build_is_unhealthy() {
    let fx = Fixture::new().await;
    fx.jenkins.add_job("green", &[Some("SUCCESS")]);
    fx.jenkins.add_job("red", &[Some("FAILURE"), Some("SUCCESS")]);
    let published = fx.publish_with_jobs("21", &["green", "red"]);
    fx.register(&published).await;

    let response = fx
        .monitor
        .workflow_response(None, published.uuid, "1", detail(true, false, false))
        .await
        .unwrap();

    assert_eq!(response.healthy, Health::Unhealthy);
    assert!(response.issues.is_empty());
    let suites = response.test_suite.unwrap();
    let instances = &suites[0].test;
    assert_eq!(instances[0].testing_service.workflow_healthy, Health::Healthy);
    assert_eq!(instances[1].testing_service.workflow_healthy, Health::Unhealthy);
    assert!(instances[1].testing_service.builds.is_none());
}

#[actix_rt::test]
async fn test_running_or_missing_build_is_unhealthy() {
    let fx = Fixture::new().await;
    fx.jenkins.add_job("running", &[None, Some("SUCCESS")]);
    fx.jenkins.add_job("fresh", &[]);
    let published = fx.publish_with_jobs("22", &["running", "fresh"]);
    fx.register(&published).await;

    let response = fx
        .monitor
        .workflow_response(None, published.uuid, "1", detail(true, false, false))
        .await
        .unwrap();

    assert_eq!(response.healthy, Health::Unhealthy);
    let instances = &response.test_suite.unwrap()[0].test;
    assert!(instances.iter().all(|i| i.testing_service.workflow_healthy == Health::Unhealthy));
}

#[actix_rt::test]
async fn test_unreachable_job_is_unknown_and_dominates() {
    let fx = Fixture::new().await;
    fx.jenkins.add_job("red", &[Some("FAILURE")]);
    let published = fx.publish_with_jobs("23", &["red", "ghost"]);
    fx.register(&published).await;

    let response = fx
        .monitor
        .workflow_response(None, published.uuid, "1", DetailOptions::default())
        .await
        .unwrap();

    assert_eq!(response.healthy, Health::Unknown);
    assert_eq!(response.issues.len(), 1);
    assert!(response.issues[0].contains("ghost"), "{:?}", response.issues);
    assert_eq!(serde_json::to_value(&response).unwrap()["isHealthy"], json!("Unknown"));
}

#[actix_rt::test]
async fn test_workflow_without_instances_is_healthy() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("24", &[]);
    fx.register(&published).await;

    let response = fx
        .monitor
        .workflow_response(None, published.uuid, "1", detail(true, true, false))
        .await
        .unwrap();

    assert_eq!(response.healthy, Health::Healthy);
    let suites = response.test_suite.unwrap();
    assert_eq!(suites.len(), 1);
    assert!(suites[0].test.is_empty());
}

#[actix_rt::test]
async fn test_build_details_and_output() {
    let fx = Fixture::new().await;
    fx.jenkins.add_job(
        "wf",
        &[Some("FAILURE"), Some("SUCCESS"), Some("SUCCESS"), Some("ABORTED"), Some("SUCCESS")],
    );
    let published = fx.publish_with_jobs("25", &["wf"]);
    let workflow = fx.register(&published).await;
    let instance_id = workflow.test_suites[0].instances[0].id;

    let instance = fx
        .monitor
        .instance_response(instance_id, detail(false, true, false))
        .await
        .unwrap();
    let builds = instance.testing_service.builds.unwrap();
    assert_eq!(builds.last_test_build.as_ref().unwrap().build_number, 5);
    assert!(!builds.last_test_build.as_ref().unwrap().success);
    assert_eq!(builds.last_successful_test_build.as_ref().unwrap().build_number, 4);
    assert_eq!(builds.last_failed_test_build.as_ref().unwrap().build_number, 5);
    // capped by max_listed_builds
    let numbers: Vec<i64> = builds.test_builds.iter().map(|b| b.build_number).collect();
    assert_eq!(numbers, vec![5, 4, 3]);
    assert!(builds.test_builds.iter().all(|b| b.output.is_none()));

    let with_output = fx
        .monitor
        .instance_response(instance_id, detail(false, false, true))
        .await
        .unwrap();
    let builds = with_output.testing_service.builds.unwrap();
    let output = builds.last_test_build.unwrap().output.unwrap();
    assert!(output.starts_with("Started build #5"));
    assert!(builds.test_builds.iter().all(|b| b.output.is_some()));
}

#[actix_rt::test]
async fn test_build_fetch_errors_become_instance_issues() {
    let fx = Fixture::new().await;
    let published = fx.publish_with_jobs("26", &["ghost"]);
    let workflow = fx.register(&published).await;
    let suite_id = workflow.test_suites[0].id;

    let suite = fx
        .monitor
        .suite_response(suite_id, detail(false, true, false))
        .await
        .unwrap();

    assert_eq!(suite.healthy, Health::Unknown);
    assert_eq!(suite.workflow.as_ref().unwrap().uuid, published.uuid);
    let instance = &suite.test[0];
    assert!(instance.testing_service.builds.is_none());
    // health and build fetch report the same message once
    assert_eq!(instance.issues.len(), 1);
    assert!(instance.issues[0].contains("ghost"));
}
