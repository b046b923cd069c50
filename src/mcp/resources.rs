//! MCP Resources Support
//!
//! A fixed catalog of project files exposed as `file://` resources, plus the
//! reader behind `resources/read`.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Scheme prefix of readable resource URIs.
pub const FILE_SCHEME: &str = "file://";

/// MIME type reported for every read, regardless of the catalog entry.
pub const READ_MIME_TYPE: &str = "text/plain";

/// Decode a percent-encoded file:// URI path to a PathBuf.
///
/// Handles percent-encoded characters like `%20` (space) and properly converts
/// the decoded string to a filesystem path.
fn decode_file_uri(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix(FILE_SCHEME).map(|path| {
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        PathBuf::from(decoded.as_ref())
    })
}

/// Build a `file://` URI for an absolute path.
fn path_to_file_uri(path: &Path) -> String {
    let path_str = path.to_string_lossy().replace('\\', "/");
    if path_str.starts_with('/') {
        format!("{}{}", FILE_SCHEME, path_str)
    } else {
        // Windows drive paths need the extra slash: file:///C:/...
        format!("{}/{}", FILE_SCHEME, path_str)
    }
}

/// A resource exposed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Resource contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Result of resources/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourcesResult {
    pub resources: Vec<Resource>,
}

/// Result of resources/read.
///
/// A failed read is still a result: the single content block carries the
/// error description and `is_error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ReadResourceResult {
    fn text(uri: &str, text: String, is_error: bool) -> Self {
        Self {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: Some(READ_MIME_TYPE.to_string()),
                text: Some(text),
            }],
            is_error,
        }
    }
}

/// Resource catalog. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
}

impl ResourceRegistry {
    /// Creates the built-in catalog pointing into `root`.
    pub fn new(root: &Path) -> Self {
        let entries = [
            ("README.md", "README", "Project README file", "text/markdown"),
            (
                "Cargo.toml",
                "Package Configuration",
                "Cargo package configuration",
                "application/toml",
            ),
        ];

        let resources = entries
            .iter()
            .map(|(file, name, description, mime)| Resource {
                uri: path_to_file_uri(&root.join(file)),
                name: name.to_string(),
                description: Some(description.to_string()),
                mime_type: Some(mime.to_string()),
            })
            .collect();

        Self { resources }
    }

    /// Lists the catalog.
    pub fn list(&self) -> ListResourcesResult {
        ListResourcesResult {
            resources: self.resources.clone(),
        }
    }

    /// Reads a `file://` URI.
    ///
    /// Any URI is accepted, not only catalog entries. Unsupported schemes and
    /// I/O failures come back as an error block, never as `Err`.
    pub async fn read(&self, uri: &str) -> ReadResourceResult {
        let Some(path) = decode_file_uri(uri) else {
            warn!("Unsupported URI scheme: {}", uri);
            return ReadResourceResult::text(
                uri,
                format!("Error reading resource: Unsupported URI scheme: {}", uri),
                true,
            );
        };

        debug!("Reading resource {} from {:?}", uri, path);
        match fs::read(&path).await {
            Ok(bytes) => {
                ReadResourceResult::text(uri, String::from_utf8_lossy(&bytes).into_owned(), false)
            }
            Err(e) => {
                warn!("Failed to read resource {}: {}", uri, e);
                ReadResourceResult::text(
                    uri,
                    format!("Error reading resource: {}: {}", path.display(), e),
                    true,
                )
            }
        }
    }
}
