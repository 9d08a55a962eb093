//! Test suites and the tests view of their definition document.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::health::Health;
use super::test_instance::{InstanceResponse, TestInstance};
use super::workflow::WorkflowSummary;
use crate::error::{AppError, AppResult};

/// A named test declared by a suite's definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub name: String,
    pub specification: Option<JsonValue>,
}

/// A test suite of one workflow version.
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub submitter_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub instances: Vec<TestInstance>,
    definition: Option<JsonValue>,
    tests: OnceLock<Vec<Test>>,
}

impl TestSuite {
    pub fn new(
        id: Uuid,
        workflow_id: Uuid,
        submitter_id: Uuid,
        definition: Option<JsonValue>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workflow_id,
            submitter_id,
            created_at,
            instances: Vec::new(),
            definition,
            tests: OnceLock::new(),
        }
    }

    /// Raw test definition document.
    pub fn definition(&self) -> Option<&JsonValue> {
        self.definition.as_ref()
    }

    /// Replace the definition document and drop the decoded tests.
    pub fn set_definition(&mut self, definition: Option<JsonValue>) {
        self.definition = definition;
        self.tests = OnceLock::new();
    }

    /// Tests declared by the definition, decoded once per definition.
    ///
    /// A test name declared twice keeps its first position and its last
    /// specification.
    pub fn tests(&self) -> AppResult<&[Test]> {
        if let Some(tests) = self.tests.get() {
            return Ok(tests);
        }
        let decoded = decode_tests(self.definition.as_ref())?;
        Ok(self.tests.get_or_init(|| decoded))
    }

    /// Look up a test by name.
    pub fn test(&self, name: &str) -> AppResult<Option<&Test>> {
        Ok(self.tests()?.iter().find(|t| t.name == name))
    }

    /// Instances executing the test called `name`, in declaration order.
    pub fn instances_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TestInstance> {
        self.instances.iter().filter(move |i| i.name == name)
    }

    pub fn instances_for(&self, test: &Test) -> Vec<&TestInstance> {
        self.instances
            .iter()
            .filter(|i| i.name == test.name)
            .collect()
    }
}

fn decode_tests(definition: Option<&JsonValue>) -> AppResult<Vec<Test>> {
    let definition = match definition {
        None | Some(JsonValue::Null) => {
            return Err(AppError::SpecificationNotDefined(
                "test suite has no test definition".to_string(),
            ));
        }
        Some(JsonValue::Object(map)) if map.is_empty() => {
            return Err(AppError::SpecificationNotDefined(
                "test suite has no test definition".to_string(),
            ));
        }
        Some(d) => d,
    };

    let entries = definition
        .get("test")
        .ok_or_else(|| AppError::SpecificationNotValid("Missing property: test".to_string()))?
        .as_array()
        .ok_or_else(|| {
            AppError::SpecificationNotValid("Property 'test' must be a list".to_string())
        })?;

    let mut tests: Vec<Test> = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let name = entry
            .get("name")
            .ok_or_else(|| {
                AppError::SpecificationNotValid(format!("Missing property: name (test[{}])", idx))
            })?
            .as_str()
            .ok_or_else(|| {
                AppError::SpecificationNotValid(format!(
                    "Property 'name' must be a string (test[{}])",
                    idx
                ))
            })?;
        let specification = entry.get("specification").cloned();

        match tests.iter_mut().find(|t| t.name == name) {
            Some(existing) => existing.specification = specification,
            None => tests.push(Test {
                name: name.to_string(),
                specification,
            }),
        }
    }

    Ok(tests)
}

/// Suite envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResponse {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowSummary>,
    #[serde(rename = "isHealthy")]
    pub healthy: Health,
    pub issues: Vec<String>,
    pub test: Vec<InstanceResponse>,
}
