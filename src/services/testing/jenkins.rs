//! Jenkins testing service adapter.
//!
//! The job is the last segment of the binding's resource path, so both
//! `job/wf-tests` and `job/folder/job/wf-tests` resolve to `wf-tests`.
//! Queries use the Jenkins JSON API:
//! - job info: `{url}/job/{job}/api/json`
//! - build info: `{url}/job/{job}/{number}/api/json`
//! - console log: `{url}/job/{job}/{number}/consoleText`

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{AdapterContext, MetadataCache, TestingServiceAdapter};
use crate::error::TestingServiceError;
use crate::models::{BuildResult, TestBuild, TestingServiceBinding};

/// Type tag used in test definitions.
pub const SERVICE_TYPE: &str = "jenkins";

#[derive(Debug, Clone, Deserialize)]
struct BuildRef {
    number: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobInfo {
    last_build: Option<BuildRef>,
    last_successful_build: Option<BuildRef>,
    last_failed_build: Option<BuildRef>,
    #[serde(default)]
    builds: Vec<BuildRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct BuildInfo {
    number: i64,
    result: Option<String>,
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    actions: Vec<JsonValue>,
}

impl From<BuildInfo> for TestBuild {
    fn from(info: BuildInfo) -> Self {
        TestBuild {
            number: info.number,
            revision: revision(&info.actions),
            duration_ms: info.duration,
            result: classify_result(info.result.as_deref()),
            url: info.url,
        }
    }
}

/// Extract the Jenkins job name from a resource path.
pub fn job_name(resource: Option<&str>) -> Result<String, TestingServiceError> {
    let raw = resource.unwrap_or_default();
    let trimmed = raw.trim_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or_default();
    if name.is_empty() {
        return Err(TestingServiceError::new(format!(
            "Unable to get the Jenkins job from the resource '{}'",
            raw
        )));
    }
    Ok(name.to_string())
}

/// `SUCCESS` is the only successful result; in-progress builds count as failed.
pub fn classify_result(result: Option<&str>) -> BuildResult {
    match result {
        Some("SUCCESS") => BuildResult::Success,
        _ => BuildResult::Failed,
    }
}

/// The built revision, when exactly one action reports it.
pub fn revision(actions: &[JsonValue]) -> Option<JsonValue> {
    let mut revisions = actions
        .iter()
        .filter_map(|action| action.get("lastBuiltRevision"));
    match (revisions.next(), revisions.next()) {
        (Some(rev), None) => Some(rev.clone()),
        _ => None,
    }
}

/// Adapter over one Jenkins job.
pub struct JenkinsAdapter {
    binding: TestingServiceBinding,
    http: reqwest::Client,
    cache: MetadataCache,
}

impl JenkinsAdapter {
    pub fn new(binding: TestingServiceBinding, context: &AdapterContext) -> Self {
        Self {
            binding,
            http: context.http.clone(),
            cache: context.cache.clone(),
        }
    }

    fn job(&self) -> Result<String, TestingServiceError> {
        job_name(self.binding.resource.as_deref())
    }

    fn job_url(&self, job: &str) -> String {
        format!(
            "{}/job/{}",
            self.binding.base_url(),
            urlencoding::encode(job)
        )
    }

    /// Cached job metadata is only shared between bindings with the same credentials.
    fn cache_key(&self, job: &str) -> String {
        let credentials = match &self.binding.token {
            Some(token) => {
                let mut hasher = Sha256::new();
                hasher.update(token.key.as_bytes());
                hasher.update(b":");
                hasher.update(token.secret.expose_secret().as_bytes());
                hex::encode(hasher.finalize())
            }
            None => "anonymous".to_string(),
        };
        format!("{}|{}|{}", self.binding.base_url(), credentials, job)
    }

    /// GET `url` with the binding's basic-auth credentials, if any.
    async fn fetch_text(&self, url: &str, subject: &str) -> Result<String, TestingServiceError> {
        debug!(url = %url, "Querying Jenkins");

        let mut request = self.http.get(url);
        if let Some(token) = &self.binding.token {
            request = request.basic_auth(&token.key, Some(token.secret.expose_secret()));
        }

        let response = request.send().await.map_err(|e| {
            TestingServiceError::new(format!(
                "Error connecting to Jenkins at {}: {}",
                self.binding.base_url(),
                e
            ))
        })?;

        match response.status() {
            status if status.is_success() => response.text().await.map_err(|e| {
                TestingServiceError::new(format!("Error reading Jenkins response: {}", e))
            }),
            StatusCode::NOT_FOUND => Err(TestingServiceError::new(format!(
                "{} does not exist",
                subject
            ))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TestingServiceError::new(
                format!("Not authorized to access {} ({})", subject, response.status()),
            )),
            status => Err(TestingServiceError::new(format!(
                "Jenkins returned {} for {}",
                status, subject
            ))),
        }
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        subject: &str,
    ) -> Result<T, TestingServiceError> {
        let body = self.fetch_text(url, subject).await?;
        serde_json::from_str(&body).map_err(|e| {
            TestingServiceError::new(format!("Invalid Jenkins response for {}: {}", subject, e))
        })
    }

    async fn job_info(&self) -> Result<JobInfo, TestingServiceError> {
        let job = self.job()?;
        let key = self.cache_key(&job);

        let raw = match self.cache.get(&key).await {
            Some(cached) => cached,
            None => {
                let url = format!("{}/api/json", self.job_url(&job));
                let fetched: JsonValue = self.fetch_json(&url, &format!("job[{}]", job)).await?;
                self.cache.insert(key, fetched.clone()).await;
                fetched
            }
        };

        serde_json::from_value(raw).map_err(|e| {
            TestingServiceError::new(format!("Invalid Jenkins metadata for job[{}]: {}", job, e))
        })
    }

    async fn build_ref(&self, build: Option<BuildRef>) -> Result<Option<TestBuild>, TestingServiceError> {
        match build {
            Some(b) => self.build(b.number).await.map(Some),
            None => Ok(None),
        }
    }

    async fn builds(&self, refs: Vec<BuildRef>) -> Result<Vec<TestBuild>, TestingServiceError> {
        let mut builds = Vec::with_capacity(refs.len());
        for r in refs {
            builds.push(self.build(r.number).await?);
        }
        Ok(builds)
    }
}

#[async_trait]
impl TestingServiceAdapter for JenkinsAdapter {
    fn binding(&self) -> &TestingServiceBinding {
        &self.binding
    }

    async fn last_build(&self) -> Result<Option<TestBuild>, TestingServiceError> {
        let info = self.job_info().await?;
        self.build_ref(info.last_build).await
    }

    async fn last_successful_build(&self) -> Result<Option<TestBuild>, TestingServiceError> {
        let info = self.job_info().await?;
        self.build_ref(info.last_successful_build).await
    }

    async fn last_failed_build(&self) -> Result<Option<TestBuild>, TestingServiceError> {
        let info = self.job_info().await?;
        self.build_ref(info.last_failed_build).await
    }

    async fn list_builds(&self) -> Result<Vec<TestBuild>, TestingServiceError> {
        let info = self.job_info().await?;
        self.builds(info.builds).await
    }

    async fn build(&self, number: i64) -> Result<TestBuild, TestingServiceError> {
        let job = self.job()?;
        let url = format!("{}/{}/api/json", self.job_url(&job), number);
        let info: BuildInfo = self
            .fetch_json(&url, &format!("build #{} of job[{}]", number, job))
            .await?;
        Ok(info.into())
    }

    async fn build_output(&self, number: i64) -> Result<String, TestingServiceError> {
        let job = self.job()?;
        let url = format!("{}/{}/consoleText", self.job_url(&job), number);
        self.fetch_text(&url, &format!("console of build #{} of job[{}]", number, job))
            .await
    }

    /// Only the first `limit` builds are fetched.
    async fn recent_builds(&self, limit: usize) -> Result<Vec<TestBuild>, TestingServiceError> {
        let mut refs = self.job_info().await?.builds;
        refs.truncate(limit);
        self.builds(refs).await
    }
}
