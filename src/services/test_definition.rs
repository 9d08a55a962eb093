//! Test definition parsing.
//!
//! A definition document has the shape
//!
//! ```json
//! {"test": [{"name": "...", "specification": {...},
//!            "instance": [{"service": {"type": "jenkins", "url": "...", "resource": "..."},
//!                          "parameters": {...}}]}]}
//! ```
//!
//! Parsing is all-or-nothing: the first structural error or unsupported
//! service type aborts the whole document and nothing is attached to the
//! suite.

use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{TestInstance, TestSuite, TestingServiceBinding, TestingServiceToken};
use crate::services::testing::TestingServiceFactory;

/// One resolved instance entry, in declaration order.
#[derive(Debug, Clone)]
pub struct ParsedInstance {
    pub test_name: String,
    pub parameters: Option<JsonValue>,
    pub binding: TestingServiceBinding,
}

/// Decode a definition document given as JSON or YAML text.
pub fn parse_document(text: &str) -> AppResult<JsonValue> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str::<JsonValue>(text).map_err(|yaml_err| {
            AppError::SpecificationNotValid(format!(
                "Test definition is neither JSON ({}) nor YAML ({})",
                json_err, yaml_err
            ))
        }),
    }
}

/// Resolve every instance entry of `definition` into a testing service binding.
pub fn parse(definition: &JsonValue, factory: &TestingServiceFactory) -> AppResult<Vec<ParsedInstance>> {
    let root = definition.as_object().ok_or_else(|| {
        AppError::SpecificationNotValid("Test definition must be an object".to_string())
    })?;
    let tests = required_array(root, "test", "definition")?;

    let mut parsed = Vec::new();
    for (t_idx, test) in tests.iter().enumerate() {
        let test_at = format!("test[{}]", t_idx);
        let test = as_object(test, &test_at)?;
        let name = required_str(test, "name", &test_at)?;
        let instances = required_array(test, "instance", &test_at)?;

        for (i_idx, instance) in instances.iter().enumerate() {
            let instance_at = format!("{}.instance[{}]", test_at, i_idx);
            let instance = as_object(instance, &instance_at)?;
            let service_at = format!("{}.service", instance_at);
            let service = instance
                .get("service")
                .ok_or_else(|| missing("service", &instance_at))
                .and_then(|s| as_object(s, &service_at))?;

            let service_type = required_str(service, "type", &service_at)?;
            if !factory.is_supported(service_type) {
                return Err(AppError::TestingServiceNotSupported(format!(
                    "'{}' at {}",
                    service_type, service_at
                )));
            }
            let url = required_str(service, "url", &service_at)?;
            let resource = optional_str(service, "resource", &service_at)?;
            let token = match (
                optional_str(service, "key", &service_at)?,
                optional_str(service, "secret", &service_at)?,
            ) {
                (Some(key), Some(secret)) => Some(TestingServiceToken {
                    key: key.to_string(),
                    secret: SecretString::from(secret.to_string()),
                }),
                (None, None) => None,
                _ => {
                    return Err(AppError::SpecificationNotValid(format!(
                        "Properties 'key' and 'secret' must be given together ({})",
                        service_at
                    )));
                }
            };

            parsed.push(ParsedInstance {
                test_name: name.to_string(),
                parameters: instance.get("parameters").cloned(),
                binding: TestingServiceBinding {
                    id: Uuid::new_v4(),
                    service_type: service_type.to_lowercase(),
                    url: url.to_string(),
                    resource: resource.map(str::to_string),
                    token,
                },
            });
        }
    }

    Ok(parsed)
}

/// Build a new suite for `workflow_id` with one instance per parsed entry.
pub fn build_suite(
    workflow_id: Uuid,
    submitter_id: Uuid,
    definition: JsonValue,
    factory: &TestingServiceFactory,
) -> AppResult<TestSuite> {
    let parsed = parse(&definition, factory)?;

    let mut suite = TestSuite::new(
        Uuid::new_v4(),
        workflow_id,
        submitter_id,
        Some(definition),
        Utc::now(),
    );
    let suite_id = suite.id;
    suite.instances = parsed
        .into_iter()
        .enumerate()
        .map(|(position, p)| TestInstance {
            id: p.binding.id,
            test_suite_id: suite_id,
            name: p.test_name,
            position: position as i32,
            parameters: p.parameters,
            testing_service: p.binding,
        })
        .collect();

    Ok(suite)
}

fn missing(field: &str, at: &str) -> AppError {
    AppError::SpecificationNotValid(format!("Missing property: {} ({})", field, at))
}

fn as_object<'a>(value: &'a JsonValue, at: &str) -> AppResult<&'a Map<String, JsonValue>> {
    value
        .as_object()
        .ok_or_else(|| AppError::SpecificationNotValid(format!("{} must be an object", at)))
}

fn required_array<'a>(
    object: &'a Map<String, JsonValue>,
    field: &str,
    at: &str,
) -> AppResult<&'a Vec<JsonValue>> {
    object
        .get(field)
        .ok_or_else(|| missing(field, at))?
        .as_array()
        .ok_or_else(|| {
            AppError::SpecificationNotValid(format!("Property '{}' must be a list ({})", field, at))
        })
}

fn required_str<'a>(object: &'a Map<String, JsonValue>, field: &str, at: &str) -> AppResult<&'a str> {
    optional_str(object, field, at)?.ok_or_else(|| missing(field, at))
}

fn optional_str<'a>(
    object: &'a Map<String, JsonValue>,
    field: &str,
    at: &str,
) -> AppResult<Option<&'a str>> {
    match object.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(AppError::SpecificationNotValid(format!(
            "Property '{}' must be a string ({})",
            field, at
        ))),
    }
}
