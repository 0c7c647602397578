use super::protocol::{DocumentList, DocumentWrapper, ErrorBody};
use super::{Method, Transport, TransportRequest, TransportResponse};
use crate::error::TransportError;
use crate::partition::READONLY_PARTITION;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
struct StoredEntry {
    document: Value,
    etag: String,
    timestamp: i64,
}

/// In-process document store speaking the same status codes as the remote one.
///
/// Documents live in `partition -> (id -> entry)`; ids are kept ordered so list
/// pages are stable and the continuation token is simply the last id returned.
/// Client writes to the read-only partition are refused with 403; use
/// [`InMemoryTransport::seed`] to populate it.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    partitions: Arc<DashMap<String, BTreeMap<String, StoredEntry>>>,
    calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While set, every request fails as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stores a raw document payload directly, bypassing the client rules.
    /// Returns the new version token.
    pub fn seed(&self, partition: &str, id: &str, document: Value) -> String {
        let entry = new_entry(document);
        let etag = entry.etag.clone();
        self.partitions
            .entry(partition.to_string())
            .or_default()
            .insert(id.to_string(), entry);
        etag
    }

    pub fn document_count(&self, partition: &str) -> usize {
        self.partitions
            .get(partition)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn handle_read(&self, partition: &str, id: &str) -> TransportResponse {
        match self.partitions.get(partition).and_then(|docs| docs.get(id).cloned()) {
            Some(entry) => TransportResponse::new(200, Some(wrap(partition, id, &entry))),
            None => not_found(partition, id),
        }
    }

    fn handle_list(&self, request: &TransportRequest) -> TransportResponse {
        let page_size = request.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1) as usize;
        let partition = request.partition.as_str();

        let (documents, has_more) = match self.partitions.get(partition) {
            Some(docs) => {
                let lower = match request.continuation_token.as_deref() {
                    Some(token) => Bound::Excluded(token),
                    None => Bound::Unbounded,
                };
                let mut remaining = docs.range::<str, _>((lower, Bound::Unbounded));
                let page: Vec<(String, StoredEntry)> = remaining
                    .by_ref()
                    .take(page_size)
                    .map(|(id, entry)| (id.clone(), entry.clone()))
                    .collect();
                let has_more = remaining.next().is_some();
                (page, has_more)
            }
            None => (Vec::new(), false),
        };

        let continuation_token = if has_more {
            documents.last().map(|(id, _)| id.clone())
        } else {
            None
        };

        let body = DocumentList {
            count: documents.len(),
            documents: documents
                .iter()
                .map(|(id, entry)| wrap(partition, id, entry))
                .collect(),
        };

        TransportResponse {
            status: 200,
            body: serde_json::to_value(body).ok(),
            continuation_token,
        }
    }

    fn handle_create(&self, partition: &str, body: Option<&Value>) -> TransportResponse {
        let Some(wrapper) = parse_wrapper(body) else {
            return error_response(400, "BadRequest", "body is not a document".to_string());
        };
        if wrapper.partition != partition {
            return error_response(
                400,
                "BadRequest",
                "partition in body does not match partition key header".to_string(),
            );
        }

        let mut docs = self.partitions.entry(partition.to_string()).or_default();
        if docs.contains_key(&wrapper.id) {
            return error_response(
                409,
                "Conflict",
                format!("document '{}' already exists", wrapper.id),
            );
        }

        let entry = new_entry(wrapper.document);
        let body = wrap(partition, &wrapper.id, &entry);
        docs.insert(wrapper.id, entry);
        TransportResponse::new(201, Some(body))
    }

    fn handle_replace(
        &self,
        partition: &str,
        id: &str,
        body: Option<&Value>,
        if_match: Option<&str>,
    ) -> TransportResponse {
        let Some(wrapper) = parse_wrapper(body) else {
            return error_response(400, "BadRequest", "body is not a document".to_string());
        };

        let Some(mut docs) = self.partitions.get_mut(partition) else {
            return not_found(partition, id);
        };
        let Some(current) = docs.get(id) else {
            return not_found(partition, id);
        };
        if let Some(expected) = if_match {
            if expected != current.etag {
                return error_response(
                    412,
                    "PreconditionFailed",
                    format!("document '{}' has a newer version", id),
                );
            }
        }

        let entry = new_entry(wrapper.document);
        let body = wrap(partition, id, &entry);
        docs.insert(id.to_string(), entry);
        TransportResponse::new(200, Some(body))
    }

    fn handle_delete(&self, partition: &str, id: &str) -> TransportResponse {
        let removed = self
            .partitions
            .get_mut(partition)
            .and_then(|mut docs| docs.remove(id));
        match removed {
            Some(_) => TransportResponse::new(204, None),
            None => not_found(partition, id),
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }

        let partition = request.partition.as_str();
        if request.method != Method::Get && partition == READONLY_PARTITION {
            return Ok(error_response(
                403,
                "Forbidden",
                "partition is read-only".to_string(),
            ));
        }

        let response = match (request.method, request.document_id.as_deref()) {
            (Method::Get, Some(id)) => self.handle_read(partition, id),
            (Method::Get, None) => self.handle_list(&request),
            (Method::Post, None) => self.handle_create(partition, request.body.as_ref()),
            (Method::Put, Some(id)) => self.handle_replace(
                partition,
                id,
                request.body.as_ref(),
                request.if_match.as_deref(),
            ),
            (Method::Delete, Some(id)) => self.handle_delete(partition, id),
            (method, _) => error_response(
                405,
                "MethodNotAllowed",
                format!("{} is not supported on this resource", method),
            ),
        };

        tracing::trace!(
            "in-memory {} {} -> {}",
            request.method,
            partition,
            response.status
        );
        Ok(response)
    }
}

fn new_entry(document: Value) -> StoredEntry {
    StoredEntry {
        document,
        etag: format!("\"{}\"", Uuid::new_v4()),
        timestamp: now_secs(),
    }
}

fn wrap(partition: &str, id: &str, entry: &StoredEntry) -> Value {
    let wrapper = DocumentWrapper {
        id: id.to_string(),
        partition: partition.to_string(),
        document: entry.document.clone(),
        etag: Some(entry.etag.clone()),
        timestamp: Some(entry.timestamp),
    };
    serde_json::to_value(wrapper).unwrap_or(Value::Null)
}

fn parse_wrapper(body: Option<&Value>) -> Option<DocumentWrapper> {
    body.and_then(|b| serde_json::from_value(b.clone()).ok())
}

fn not_found(partition: &str, id: &str) -> TransportResponse {
    error_response(
        404,
        "NotFound",
        format!("document '{}' not found in partition '{}'", id, partition),
    )
}

fn error_response(status: u16, code: &str, message: String) -> TransportResponse {
    let body = ErrorBody {
        code: code.to_string(),
        message,
    };
    TransportResponse::new(status, serde_json::to_value(body).ok())
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
