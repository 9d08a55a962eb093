//! RO-Crate download and inspection.
//!
//! Archives are written to a temporary file and extracted into a temporary
//! directory; both are removed when they go out of scope, on every path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::services::test_definition;

/// Crate metadata documents, in lookup order.
pub const METADATA_FILES: [&str; 2] = ["ro-crate-metadata.json", "ro-crate-metadata.jsonld"];

/// Legacy test definition locations, relative to the crate root.
pub const TEST_DEFINITION_FILES: [&str; 2] = ["test/test-metadata.json", "tests/test-metadata.json"];

/// What LifeMonitor needs from an RO-Crate.
#[derive(Debug, Clone, PartialEq)]
pub struct RoCrate {
    pub metadata: JsonValue,
    /// `name` of the crate's root data entity
    pub name: Option<String>,
    /// Legacy test definition shipped inside the crate
    pub test_definition: Option<JsonValue>,
}

/// Fetch a crate archive, optionally with a bearer token.
///
/// 401/403 responses map to [`AppError::Unauthorized`] so callers can retry
/// anonymously. Bodies larger than `max_size` bytes are rejected.
pub async fn download(
    http: &reqwest::Client,
    url: &str,
    bearer: Option<&SecretString>,
    max_size: usize,
) -> AppResult<Vec<u8>> {
    debug!(url = %url, authorized = bearer.is_some(), "Downloading RO-Crate");

    let mut request = http.get(url);
    if let Some(token) = bearer {
        request = request.bearer_auth(token.expose_secret());
    }

    let mut response = request
        .send()
        .await
        .map_err(|e| AppError::RoCrate(format!("Failed to download {}: {}", url, e)))?;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(AppError::Unauthorized(format!(
                "Not authorized to download {} ({})",
                url,
                response.status()
            )));
        }
        status if !status.is_success() => {
            return Err(AppError::RoCrate(format!(
                "Failed to download {}: HTTP {}",
                url, status
            )));
        }
        _ => {}
    }

    if let Some(len) = response.content_length()
        && len > max_size as u64
    {
        return Err(too_large(url, max_size));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AppError::RoCrate(format!("Failed to read {}: {}", url, e)))?
    {
        if body.len() + chunk.len() > max_size {
            return Err(too_large(url, max_size));
        }
        body.extend_from_slice(&chunk);
    }

    info!(url = %url, bytes = body.len(), "RO-Crate downloaded");
    Ok(body)
}

fn too_large(url: &str, max_size: usize) -> AppError {
    AppError::RoCrate(format!(
        "RO-Crate at {} exceeds the maximum size of {} bytes",
        url, max_size
    ))
}

/// Extract a crate archive and read its metadata.
pub async fn load(archive: Vec<u8>) -> AppResult<RoCrate> {
    tokio::task::spawn_blocking(move || load_blocking(&archive))
        .await
        .map_err(|e| AppError::RoCrate(format!("RO-Crate extraction task failed: {}", e)))?
}

fn io_error(context: &str) -> impl Fn(std::io::Error) -> AppError + '_ {
    move |e| AppError::RoCrate(format!("{}: {}", context, e))
}

fn load_blocking(archive: &[u8]) -> AppResult<RoCrate> {
    let mut archive_file =
        tempfile::NamedTempFile::new().map_err(io_error("Failed to create temporary file"))?;
    archive_file
        .write_all(archive)
        .map_err(io_error("Failed to write RO-Crate archive"))?;

    let extract_dir = tempfile::tempdir().map_err(io_error("Failed to create temporary directory"))?;
    let reader = archive_file
        .reopen()
        .map_err(io_error("Failed to reopen RO-Crate archive"))?;
    let mut zip = zip::ZipArchive::new(reader)
        .map_err(|e| AppError::RoCrate(format!("Invalid RO-Crate archive: {}", e)))?;
    zip.extract(extract_dir.path())
        .map_err(|e| AppError::RoCrate(format!("Failed to extract RO-Crate: {}", e)))?;

    read_crate(extract_dir.path())
}

/// Read a crate from an extracted directory.
pub fn read_crate(dir: &Path) -> AppResult<RoCrate> {
    let (root, metadata_path) = locate_metadata(dir)?;

    let raw = fs::read_to_string(&metadata_path).map_err(io_error("Failed to read crate metadata"))?;
    let metadata: JsonValue = serde_json::from_str(&raw)
        .map_err(|e| AppError::RoCrate(format!("Invalid crate metadata: {}", e)))?;

    let test_definition = match TEST_DEFINITION_FILES
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.is_file())
    {
        Some(path) => {
            debug!(path = %path.display(), "Found legacy test definition");
            let text = fs::read_to_string(&path).map_err(io_error("Failed to read test definition"))?;
            Some(test_definition::parse_document(&text)?)
        }
        None => None,
    };

    Ok(RoCrate {
        name: root_entity_name(&metadata),
        metadata,
        test_definition,
    })
}

/// Metadata file at the extraction root, or inside a single top-level folder.
fn locate_metadata(dir: &Path) -> AppResult<(PathBuf, PathBuf)> {
    let find_in = |root: &Path| {
        METADATA_FILES
            .iter()
            .map(|f| root.join(f))
            .find(|p| p.is_file())
            .map(|p| (root.to_path_buf(), p))
    };

    if let Some(found) = find_in(dir) {
        return Ok(found);
    }

    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error("Failed to list RO-Crate"))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    if let [only] = entries.as_slice()
        && only.is_dir()
        && let Some(found) = find_in(only)
    {
        return Ok(found);
    }

    Err(AppError::RoCrate(format!(
        "No {} found in RO-Crate",
        METADATA_FILES.join(" or ")
    )))
}

/// Name of the root data entity described by the metadata descriptor.
pub fn root_entity_name(metadata: &JsonValue) -> Option<String> {
    let graph = metadata.get("@graph")?.as_array()?;
    let entity = |id: &str| {
        graph
            .iter()
            .find(|e| e.get("@id").and_then(JsonValue::as_str) == Some(id))
    };

    let root_id = METADATA_FILES
        .iter()
        .filter_map(|f| entity(f))
        .find_map(|d| d.get("about")?.get("@id")?.as_str())
        .unwrap_or("./");

    entity(root_id)?
        .get("name")?
        .as_str()
        .map(str::to_string)
}
