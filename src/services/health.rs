//! Health aggregation over a workflow's test graph.
//!
//! Each instance asks its adapter for the last build. A missing or failed
//! build makes the instance unhealthy; a [`TestingServiceError`] makes it
//! `Unknown` and records the message as an issue. Every instance is
//! evaluated even once a failure is known, so the issue list is complete.

use futures_util::future::join_all;
use tracing::warn;

use crate::error::TestingServiceError;
use crate::models::{HealthReport, TestInstance, TestSuite, Workflow};
use crate::services::testing::{TestingServiceAdapter, TestingServiceFactory};

/// Health of a single adapter, from its last build.
pub async fn adapter_health(adapter: &dyn TestingServiceAdapter) -> HealthReport {
    match adapter.last_build().await {
        Ok(Some(build)) if build.is_successful() => HealthReport::healthy(),
        Ok(_) => HealthReport::unhealthy(),
        Err(TestingServiceError(message)) => {
            warn!(
                instance = %adapter.binding().id,
                url = %adapter.binding().url,
                "Testing service query failed: {}",
                message
            );
            HealthReport::unknown(message)
        }
    }
}

/// Health of one test instance.
pub async fn instance_health(factory: &TestingServiceFactory, instance: &TestInstance) -> HealthReport {
    match factory.create(&instance.testing_service) {
        Ok(adapter) => adapter_health(adapter.as_ref()).await,
        Err(e) => {
            warn!(instance = %instance.id, "Cannot build testing service adapter: {}", e);
            HealthReport::unknown(e.to_string())
        }
    }
}

/// Per-instance reports of a suite, in instance order.
pub async fn instance_reports(factory: &TestingServiceFactory, suite: &TestSuite) -> Vec<HealthReport> {
    join_all(suite.instances.iter().map(|i| instance_health(factory, i))).await
}

pub async fn suite_health(factory: &TestingServiceFactory, suite: &TestSuite) -> HealthReport {
    HealthReport::rollup(instance_reports(factory, suite).await)
}

/// Health of a workflow version. No suites means healthy.
pub async fn workflow_health(factory: &TestingServiceFactory, workflow: &Workflow) -> HealthReport {
    let suites = join_all(workflow.test_suites.iter().map(|s| suite_health(factory, s))).await;
    HealthReport::rollup(suites)
}
