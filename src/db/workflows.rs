//! Database operations for workflow versions.
//!
//! A workflow version is the aggregate root of its test graph: it is
//! inserted and deleted together with every suite, instance and testing
//! service it owns, inside one transaction.

use sea_orm::*;
use uuid::Uuid;

use super::test_suites;
use crate::entity::{test_instance, test_suite, testing_service, workflow};
use crate::error::{AppError, AppResult};
use crate::models::Workflow;

/// Row counts of the persisted test graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphCounts {
    pub workflows: u64,
    pub test_suites: u64,
    pub test_instances: u64,
    pub testing_services: u64,
}

/// Insert a workflow version and its whole test graph atomically.
pub async fn insert_graph(db: &DatabaseConnection, wf: &Workflow) -> AppResult<()> {
    let txn = db.begin().await?;

    workflow::ActiveModel {
        id: Set(wf.id),
        registry_id: Set(wf.registry_id),
        submitter_id: Set(wf.submitter_id),
        uuid: Set(wf.uuid),
        version: Set(wf.version.clone()),
        name: Set(wf.name.clone()),
        roc_link: Set(wf.roc_link.clone()),
        roc_metadata: Set(wf.roc_metadata.clone()),
        external_id: Set(wf.external_id.clone()),
        created_at: Set(wf.created_at),
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(format!(
            "Workflow {} version {} is already registered",
            wf.uuid, wf.version
        )),
        _ => AppError::Database(format!(
            "Failed to insert workflow {} version {}: {}",
            wf.uuid, wf.version, e
        )),
    })?;

    for suite in &wf.test_suites {
        test_suites::insert_suite(&txn, suite).await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Delete a workflow version and everything it owns. Returns false when absent.
pub async fn delete_graph(db: &DatabaseConnection, workflow_id: Uuid) -> AppResult<bool> {
    let txn = db.begin().await?;

    let suite_ids: Vec<Uuid> = test_suite::Entity::find()
        .filter(test_suite::Column::WorkflowId.eq(workflow_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    test_suites::delete_suites(&txn, &suite_ids).await?;

    let deleted = workflow::Entity::delete_by_id(workflow_id).exec(&txn).await?;
    txn.commit().await?;

    Ok(deleted.rows_affected > 0)
}

/// Load a workflow version with its test graph.
///
/// Without a registry, the earliest registration of (uuid, version) wins.
/// The row and its graph are read in one snapshot.
pub async fn find(
    db: &DatabaseConnection,
    registry_id: Option<Uuid>,
    uuid: Uuid,
    version: &str,
) -> AppResult<Option<Workflow>> {
    let mut query = workflow::Entity::find()
        .filter(workflow::Column::Uuid.eq(uuid))
        .filter(workflow::Column::Version.eq(version));
    if let Some(registry_id) = registry_id {
        query = query.filter(workflow::Column::RegistryId.eq(registry_id));
    }

    let txn = super::begin_snapshot(db).await?;
    let found = match query.order_by_asc(workflow::Column::CreatedAt).one(&txn).await? {
        Some(model) => Some(load_graph(&txn, model).await?),
        None => None,
    };
    txn.commit().await?;
    Ok(found)
}

/// Load a workflow version by row id.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<Workflow>> {
    let txn = super::begin_snapshot(db).await?;
    let found = match workflow::Entity::find_by_id(id).one(&txn).await? {
        Some(model) => Some(load_graph(&txn, model).await?),
        None => None,
    };
    txn.commit().await?;
    Ok(found)
}

/// Registries in which (uuid, version) is registered.
pub async fn registries_of(db: &DatabaseConnection, uuid: Uuid, version: &str) -> AppResult<Vec<Uuid>> {
    Ok(workflow::Entity::find()
        .filter(workflow::Column::Uuid.eq(uuid))
        .filter(workflow::Column::Version.eq(version))
        .order_by_asc(workflow::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.registry_id)
        .collect())
}

/// All versions of one workflow in a registry, without test graphs.
pub async fn list_versions(db: &DatabaseConnection, registry_id: Uuid, uuid: Uuid) -> AppResult<Vec<Workflow>> {
    let rows = workflow::Entity::find()
        .filter(workflow::Column::RegistryId.eq(registry_id))
        .filter(workflow::Column::Uuid.eq(uuid))
        .order_by_desc(workflow::Column::Version)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(model_to_workflow).collect())
}

/// Every workflow version registered from a registry, without test graphs.
pub async fn list_by_registry(db: &DatabaseConnection, registry_id: Uuid) -> AppResult<Vec<Workflow>> {
    let rows = workflow::Entity::find()
        .filter(workflow::Column::RegistryId.eq(registry_id))
        .order_by_asc(workflow::Column::Name)
        .order_by_asc(workflow::Column::Version)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(model_to_workflow).collect())
}

pub async fn count(db: &DatabaseConnection) -> AppResult<u64> {
    Ok(workflow::Entity::find().count(db).await?)
}

/// Row counts across the whole test graph.
pub async fn graph_counts(db: &DatabaseConnection) -> AppResult<GraphCounts> {
    Ok(GraphCounts {
        workflows: workflow::Entity::find().count(db).await?,
        test_suites: test_suite::Entity::find().count(db).await?,
        test_instances: test_instance::Entity::find().count(db).await?,
        testing_services: testing_service::Entity::find().count(db).await?,
    })
}

async fn load_graph<C: ConnectionTrait>(conn: &C, model: workflow::Model) -> AppResult<Workflow> {
    let suites = test_suites::find_by_workflow(conn, model.id).await?;
    let mut wf = model_to_workflow(model);
    wf.test_suites = suites;
    Ok(wf)
}

fn model_to_workflow(m: workflow::Model) -> Workflow {
    Workflow {
        id: m.id,
        registry_id: m.registry_id,
        submitter_id: m.submitter_id,
        uuid: m.uuid,
        version: m.version,
        name: m.name,
        roc_link: m.roc_link,
        roc_metadata: m.roc_metadata,
        external_id: m.external_id,
        created_at: m.created_at,
        test_suites: Vec::new(),
    }
}
