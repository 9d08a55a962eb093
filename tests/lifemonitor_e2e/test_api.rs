//! E2E tests: the `/api/v1` HTTP surface.

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use super::test_helpers::*;

#[actix_rt::test]
async fn test_health_and_ready() {
    let pool = create_test_pool().await;
    let monitor = create_monitor(&pool);
    let app = create_test_app(&pool, &monitor).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_mutations_require_api_key() {
    let fx = Fixture::new().await;
    let app = create_test_app(&fx.pool, &fx.monitor).await;
    let published = fx.publish_with_jobs("30", &["wf"]);

    let req = test::TestRequest::post()
        .uri("/api/v1/workflows")
        .set_json(json!({"registry": fx.registry.id, "uuid": published.uuid, "version": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/workflows")
        .insert_header(("X-API-Key", "lm_not-a-real-key"))
        .set_json(json!({"registry": fx.registry.id, "uuid": published.uuid, "version": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(fx.seek.requests(), 0);
}

#[actix_rt::test]
async fn test_list_and_get_registries() {
    let fx = Fixture::new().await;
    let app = create_test_app(&fx.pool, &fx.monitor).await;

    let req = test::TestRequest::get().uri("/api/v1/registries").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "seek");
    assert_eq!(items[0]["uri"], fx.seek.uri.as_str());
    assert!(items[0].get("client_secret").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/registries/{}", fx.registry.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], fx.registry.name.as_str());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/registries/{}", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_register_inspect_and_deregister_over_http() {
    let fx = Fixture::new().await;
    fx.jenkins.add_job("wf", &[Some("SUCCESS"), Some("FAILURE")]);
    let app = create_test_app(&fx.pool, &fx.monitor).await;
    let published = fx.publish_with_jobs("31", &["wf"]);

    let req = test::TestRequest::post()
        .uri("/api/v1/workflows")
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .set_json(json!({"registry": fx.registry.id, "uuid": published.uuid, "version": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let registered: Value = test::read_body_json(resp).await;
    assert_eq!(registered["external_id"], "31");
    assert_eq!(registered["name"], "workflow-31");
    assert_eq!(registered["test_suites"].as_array().unwrap().len(), 1);

    // same version again
    let req = test::TestRequest::post()
        .uri("/api/v1/workflows")
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .set_json(json!({"registry": fx.registry.id, "uuid": published.uuid, "version": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let workflow_uri = format!("/api/v1/workflows/{}/1", published.uuid);
    let req = test::TestRequest::get()
        .uri(&format!("{}?test_suite", workflow_uri))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isHealthy"], json!(true));
    let suite_id = body["test_suite"][0]["uuid"].as_str().unwrap().to_string();
    let instance_id = body["test_suite"][0]["test"][0]["uuid"].as_str().unwrap().to_string();
    assert!(body["test_suite"][0]["test"][0]["testing_service"].get("last_test_build").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/suites/{}", suite_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["workflow"]["uuid"], published.uuid.to_string());
    assert_eq!(body["isHealthy"], json!(true));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/instances/{}?test_build", instance_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let service = &body["testing_service"];
    assert_eq!(service["type"], "jenkins");
    assert_eq!(service["resource"], "job/wf");
    assert_eq!(service["last_test_build"]["build_number"], 2);
    assert_eq!(service["last_failed_test_build"]["build_number"], 1);
    assert_eq!(service["test_builds"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::post()
        .uri(&format!("{}/suites", workflow_uri))
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .set_json(jenkins_definition(&fx.jenkins.url, &["wf", "other"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let suite: Value = test::read_body_json(resp).await;
    assert_eq!(suite["tests"], json!(["test1"]));
    assert_eq!(suite["test_instances"], 2);

    // "other" is not a Jenkins job
    let req = test::TestRequest::get().uri(&workflow_uri).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isHealthy"], "Unknown");
    assert!(body.get("test_suite").is_none());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/suites/{}", suite["uuid"].as_str().unwrap()))
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&workflow_uri)
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&workflow_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_other_users_cannot_deregister() {
    let fx = Fixture::new().await;
    let app = create_test_app(&fx.pool, &fx.monitor).await;
    let published = fx.publish_with_jobs("32", &["wf"]);
    fx.register(&published).await;
    let (_, other_key) = create_user(&fx.pool, "mallory").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/workflows/{}/1", published.uuid))
        .insert_header(("X-API-Key", other_key.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_user_workflows_and_versions_endpoints() {
    let fx = Fixture::new().await;
    let app = create_test_app(&fx.pool, &fx.monitor).await;
    let published = fx.publish_with_jobs("33", &[]);
    fx.register(&published).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/registries/{}/workflows", fx.registry.id))
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"][0]["uuid"], published.uuid.to_string());
    assert_eq!(body["items"][0]["external_id"], "33");

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/registries/{}/workflows/{}/versions",
            fx.registry.id, published.uuid
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"][0]["version"], "1");

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/registries/{}/workflows/{}/versions",
            fx.registry.id,
            uuid::Uuid::new_v4()
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_invalid_detail_flag_is_rejected() {
    let pool = create_test_pool().await;
    let monitor = create_monitor(&pool);
    let app = create_test_app(&pool, &monitor).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/workflows/{}/1?test_build=maybe", uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_registry_query_selects_the_registration() {
    let fx = Fixture::new().await;
    let app = create_test_app(&fx.pool, &fx.monitor).await;
    let published = fx.publish_with_jobs("34", &[]);
    fx.register(&published).await;
    let workflow_uri = format!("/api/v1/workflows/{}/1", published.uuid);

    let req = test::TestRequest::get()
        .uri(&format!("{}?registry={}&test_suite", workflow_uri, fx.registry.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "workflow-34");
    assert_eq!(body["test_suite"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("{}?registry={}", workflow_uri, uuid::Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("{}?registry=seek", workflow_uri))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("{}?registry={}", workflow_uri, fx.registry.id))
        .insert_header(("X-API-Key", fx.api_key.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
