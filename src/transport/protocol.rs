//! Document Store Wire Protocol
//!
//! Resource paths, headers and the JSON shapes exchanged with the document store.
//!
//! Documents are addressed as `{base}/dbs/{database}/colls/{collection}/docs/{id}`;
//! the partition travels in a header rather than the path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Resource path segments ---

pub const SEGMENT_DATABASES: &str = "dbs";
pub const SEGMENT_COLLECTIONS: &str = "colls";
pub const SEGMENT_DOCUMENTS: &str = "docs";

// --- Headers ---

/// JSON array holding the partition key, e.g. `["user-42"]`.
pub const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
/// Maximum number of documents returned by one list page.
pub const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
/// Opaque token for the next list page (request and response).
pub const HEADER_CONTINUATION: &str = "x-ms-continuation";
/// Per-request correlation id.
pub const HEADER_ACTIVITY_ID: &str = "x-ms-activity-id";

// --- Data Transfer Objects ---

/// A stored document as the store sends and receives it.
///
/// `document` holds the application payload; the rest is store metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentWrapper {
    pub id: String,
    pub partition: String,
    pub document: Value,
    /// Version token, changes on every write.
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Last write time, seconds since the Unix epoch.
    #[serde(rename = "_ts", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Body of a list response. The continuation token arrives in a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(rename = "Documents")]
    pub documents: Vec<Value>,
    #[serde(rename = "_count", default)]
    pub count: usize,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

pub fn partition_key_header(partition: &str) -> String {
    Value::Array(vec![Value::String(partition.to_string())]).to_string()
}

/// Inverse of [`partition_key_header`]. `None` for anything but a one-string array.
pub fn parse_partition_key_header(raw: &str) -> Option<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(mut keys) if keys.len() == 1 => keys.pop(),
        _ => None,
    }
}

/// Error message carried in a response body, if any.
pub fn error_message(body: Option<&Value>) -> Option<String> {
    body.and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
