//! Transport Module
//!
//! The network collaborator the client talks through. The dispatcher only sees
//! [`Transport::send`]: one request in, one status + body out.
//!
//! ## Implementations
//! - **`http`**: `reqwest`-backed transport speaking the REST protocol in `protocol`.
//!   Owns timeouts and retry with backoff.
//! - **`memory`**: in-process store with the same status semantics, for tests and
//!   offline development.

pub mod http;
pub mod memory;
pub mod protocol;

pub use http::HttpTransport;
pub use memory::InMemoryTransport;

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Safe to resend without changing the outcome.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to the document store.
///
/// `document_id` is `None` for collection-level requests (list, create).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub partition: String,
    pub document_id: Option<String>,
    pub body: Option<Value>,
    /// Expected version token for conditional writes.
    pub if_match: Option<String>,
    pub page_size: Option<u32>,
    pub continuation_token: Option<String>,
    pub request_id: Uuid,
}

impl TransportRequest {
    pub fn new(method: Method, partition: impl Into<String>) -> Self {
        Self {
            method,
            partition: partition.into(),
            document_id: None,
            body: None,
            if_match: None,
            page_size: None,
            continuation_token: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_if_match(mut self, etag: Option<String>) -> Self {
        self.if_match = etag;
        self
    }

    pub fn with_page(mut self, page_size: Option<u32>, continuation_token: Option<String>) -> Self {
        self.page_size = page_size;
        self.continuation_token = continuation_token;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub continuation_token: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            body,
            continuation_token: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and reports the store's status and body.
    ///
    /// Non-success statuses are a normal `Ok` response; `Err` is reserved for
    /// failures where no response was obtained.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
