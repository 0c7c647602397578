use super::protocol::*;
use super::{Method, Transport, TransportRequest, TransportResponse};
use crate::config::DataStorageConfig;
use crate::error::TransportError;

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header};
use std::time::Duration;

const INITIAL_BACKOFF_MS: u64 = 150;
const MAX_BACKOFF_MS: u64 = 1200;

/// Talks to the document store over HTTP.
///
/// Retries connection failures for every method, and timeouts, 429 and 5xx
/// responses for reads only. Status codes are otherwise reported untouched.
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
    database: String,
    collection: String,
    timeout: Duration,
    attempts: usize,
    auth_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &DataStorageConfig) -> Result<Self, TransportError> {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(
        config: &DataStorageConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            TransportError::InvalidRequest(format!("bad base url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidRequest(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            database: config.database.clone(),
            collection: config.collection.clone(),
            timeout: config.timeout(),
            attempts: config.retry_attempts.max(1),
            auth_token: config.auth_token.clone(),
        })
    }

    fn url_for(&self, document_id: Option<&str>) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::InvalidRequest("base url cannot carry a path".to_string())
            })?;
            segments.pop_if_empty().extend([
                SEGMENT_DATABASES,
                self.database.as_str(),
                SEGMENT_COLLECTIONS,
                self.collection.as_str(),
                SEGMENT_DOCUMENTS,
            ]);
            if let Some(id) = document_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn build_request(&self, url: &Url, request: &TransportRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .http_client
            .request(method, url.clone())
            .timeout(self.timeout)
            .header(HEADER_PARTITION_KEY, partition_key_header(&request.partition))
            .header(HEADER_ACTIVITY_ID, request.request_id.to_string());

        if let Some(token) = &self.auth_token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        if let Some(etag) = &request.if_match {
            builder = builder.header(header::IF_MATCH, etag);
        }
        if let Some(page_size) = request.page_size {
            builder = builder.header(HEADER_MAX_ITEM_COUNT, page_size.to_string());
        }
        if let Some(token) = &request.continuation_token {
            builder = builder.header(HEADER_CONTINUATION, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }

    async fn send_with_retry(
        &self,
        url: &Url,
        request: &TransportRequest,
    ) -> Result<reqwest::Response, TransportError> {
        let mut delay_ms = INITIAL_BACKOFF_MS;

        for attempt in 0..self.attempts {
            let last_attempt = attempt + 1 == self.attempts;

            match self.build_request(url, request).send().await {
                Ok(resp) => {
                    if last_attempt
                        || !request.method.is_idempotent()
                        || !is_retryable_status(resp.status())
                    {
                        return Ok(resp);
                    }
                    tracing::warn!(
                        "{} {} returned {}, retrying (attempt {}/{})",
                        request.method,
                        url,
                        resp.status(),
                        attempt + 1,
                        self.attempts
                    );
                }
                Err(e) => {
                    let retryable = e.is_connect() || (e.is_timeout() && request.method.is_idempotent());
                    if last_attempt || !retryable {
                        return Err(self.map_error(e));
                    }
                    tracing::warn!(
                        "{} {} failed: {}, retrying (attempt {}/{})",
                        request.method,
                        url,
                        e,
                        attempt + 1,
                        self.attempts
                    );
                }
            }

            let jitter = rand::random::<u64>() % 50;
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
            delay_ms = (delay_ms * 2).min(MAX_BACKOFF_MS);
        }

        Err(TransportError::Unavailable(
            "retry attempts exhausted".to_string(),
        ))
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Http(e)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(request.document_id.as_deref())?;
        let response = self.send_with_retry(&url, &request).await?;

        let status = response.status().as_u16();
        let continuation_token = response
            .headers()
            .get(HEADER_CONTINUATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                // Error pages from proxies are not JSON; the status still tells the story.
                Err(_) if !(200..300).contains(&status) => None,
                Err(e) => {
                    return Err(TransportError::InvalidResponse(format!(
                        "{} {} returned non-JSON body: {}",
                        request.method, url, e
                    )));
                }
            }
        };

        tracing::debug!("{} {} -> {}", request.method, url, status);

        Ok(TransportResponse {
            status,
            body,
            continuation_token,
        })
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
