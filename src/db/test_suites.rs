//! Database operations for test suites, their instances and testing services.
//!
//! A suite is always written and removed together with its instances and
//! their testing service rows.

use std::collections::HashMap;

use sea_orm::*;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::entity::{test_instance, test_suite, testing_service};
use crate::error::{AppError, AppResult};
use crate::models::{TestInstance, TestSuite, TestingServiceBinding, TestingServiceToken};

/// Insert a suite with its instances and services on an open connection or transaction.
pub async fn insert_suite<C: ConnectionTrait>(conn: &C, suite: &TestSuite) -> AppResult<()> {
    test_suite::ActiveModel {
        id: Set(suite.id),
        workflow_id: Set(suite.workflow_id),
        submitter_id: Set(suite.submitter_id),
        test_definition: Set(suite.definition().cloned()),
        created_at: Set(suite.created_at),
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to insert test suite: {}", e)))?;

    for instance in &suite.instances {
        test_instance::ActiveModel {
            id: Set(instance.id),
            test_suite_id: Set(suite.id),
            name: Set(instance.name.clone()),
            position: Set(instance.position),
            parameters: Set(instance.parameters.clone()),
        }
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert test instance: {}", e)))?;

        let service = &instance.testing_service;
        testing_service::ActiveModel {
            id: Set(instance.id),
            service_type: Set(service.service_type.clone()),
            url: Set(service.url.clone()),
            resource: Set(service.resource.clone()),
            key: Set(service.token.as_ref().map(|t| t.key.clone())),
            secret: Set(service
                .token
                .as_ref()
                .map(|t| t.secret.expose_secret().to_string())),
        }
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert testing service: {}", e)))?;
    }

    Ok(())
}

/// Insert one suite atomically.
pub async fn insert(db: &DatabaseConnection, suite: &TestSuite) -> AppResult<()> {
    let txn = db.begin().await?;
    insert_suite(&txn, suite).await?;
    txn.commit().await?;
    Ok(())
}

/// Delete suites with all of their instances and services.
pub async fn delete_suites<C: ConnectionTrait>(conn: &C, suite_ids: &[Uuid]) -> AppResult<u64> {
    if suite_ids.is_empty() {
        return Ok(0);
    }

    let instance_ids: Vec<Uuid> = test_instance::Entity::find()
        .filter(test_instance::Column::TestSuiteId.is_in(suite_ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();

    if !instance_ids.is_empty() {
        testing_service::Entity::delete_many()
            .filter(testing_service::Column::Id.is_in(instance_ids.iter().copied()))
            .exec(conn)
            .await?;
        test_instance::Entity::delete_many()
            .filter(test_instance::Column::Id.is_in(instance_ids))
            .exec(conn)
            .await?;
    }

    let deleted = test_suite::Entity::delete_many()
        .filter(test_suite::Column::Id.is_in(suite_ids.iter().copied()))
        .exec(conn)
        .await?;

    Ok(deleted.rows_affected)
}

/// Delete one suite atomically. Returns false when it did not exist.
pub async fn delete(db: &DatabaseConnection, suite_id: Uuid) -> AppResult<bool> {
    let txn = db.begin().await?;
    let deleted = delete_suites(&txn, &[suite_id]).await?;
    txn.commit().await?;
    Ok(deleted > 0)
}

/// Load one suite with its instances.
pub async fn find_by_id(db: &DatabaseConnection, suite_id: Uuid) -> AppResult<Option<TestSuite>> {
    let txn = super::begin_snapshot(db).await?;
    let found = match test_suite::Entity::find_by_id(suite_id).one(&txn).await? {
        Some(model) => attach_instances(&txn, vec![model]).await?.pop(),
        None => None,
    };
    txn.commit().await?;
    Ok(found)
}

/// Load every suite of a workflow, oldest first.
pub async fn find_by_workflow<C: ConnectionTrait>(conn: &C, workflow_id: Uuid) -> AppResult<Vec<TestSuite>> {
    let models = test_suite::Entity::find()
        .filter(test_suite::Column::WorkflowId.eq(workflow_id))
        .order_by_asc(test_suite::Column::CreatedAt)
        .order_by_asc(test_suite::Column::Id)
        .all(conn)
        .await?;
    attach_instances(conn, models).await
}

/// Load one test instance with its testing service.
pub async fn find_instance(db: &DatabaseConnection, instance_id: Uuid) -> AppResult<Option<TestInstance>> {
    let result = test_instance::Entity::find_by_id(instance_id)
        .find_also_related(testing_service::Entity)
        .one(db)
        .await?;

    match result {
        Some((instance, Some(service))) => Ok(Some(model_to_instance(instance, service))),
        Some((instance, None)) => Err(AppError::Database(format!(
            "Test instance {} has no testing service",
            instance.id
        ))),
        None => Ok(None),
    }
}

async fn attach_instances<C: ConnectionTrait>(
    conn: &C,
    models: Vec<test_suite::Model>,
) -> AppResult<Vec<TestSuite>> {
    let suite_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let rows = if suite_ids.is_empty() {
        Vec::new()
    } else {
        test_instance::Entity::find()
            .filter(test_instance::Column::TestSuiteId.is_in(suite_ids))
            .find_also_related(testing_service::Entity)
            .order_by_asc(test_instance::Column::Position)
            .all(conn)
            .await?
    };

    let mut by_suite: HashMap<Uuid, Vec<TestInstance>> = HashMap::new();
    for (instance, service) in rows {
        let service = service.ok_or_else(|| {
            AppError::Database(format!("Test instance {} has no testing service", instance.id))
        })?;
        by_suite
            .entry(instance.test_suite_id)
            .or_default()
            .push(model_to_instance(instance, service));
    }

    Ok(models
        .into_iter()
        .map(|m| {
            let mut suite = TestSuite::new(m.id, m.workflow_id, m.submitter_id, m.test_definition, m.created_at);
            suite.instances = by_suite.remove(&m.id).unwrap_or_default();
            suite
        })
        .collect())
}

fn model_to_instance(instance: test_instance::Model, service: testing_service::Model) -> TestInstance {
    let token = match (service.key, service.secret) {
        (Some(key), Some(secret)) => Some(TestingServiceToken {
            key,
            secret: SecretString::from(secret),
        }),
        _ => None,
    };

    TestInstance {
        id: instance.id,
        test_suite_id: instance.test_suite_id,
        name: instance.name,
        position: instance.position,
        parameters: instance.parameters,
        testing_service: TestingServiceBinding {
            id: service.id,
            service_type: service.service_type,
            url: service.url,
            resource: service.resource,
            token,
        },
    }
}
