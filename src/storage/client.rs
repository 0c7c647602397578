use crate::config::{DataStorageConfig, MAX_PAGE_SIZE};
use crate::document::codec::{self, DocumentType, SerializableDocument};
use crate::document::envelope::{Document, Documents, ListOptions, Page, StoredDocument};
use crate::document::validate_document_id;
use crate::error::{DataStorageError, Result, TransportError};
use crate::partition::{IdentityProvider, PartitionResolver, ResolvedPartition};
use crate::transport::protocol::{DocumentList, error_message};
use crate::transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};

use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// Typed CRUD client for a partitioned document store.
///
/// Holds only its collaborators and configuration, so clones are cheap and
/// share nothing mutable. Every operation yields exactly one envelope; errors
/// are never raised any other way.
#[derive(Clone)]
pub struct DataStorage {
    transport: Arc<dyn Transport>,
    resolver: PartitionResolver,
    config: Arc<DataStorageConfig>,
}

impl DataStorage {
    pub fn new(
        config: DataStorageConfig,
        transport: Arc<dyn Transport>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            transport,
            resolver: PartitionResolver::new(identity),
            config: Arc::new(config),
        }
    }

    /// Client over [`HttpTransport`] built from `config`.
    pub fn http(config: DataStorageConfig, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DataStorageError::InvalidArgument(e.to_string()))?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, Arc::new(transport), identity))
    }

    pub fn config(&self) -> &DataStorageConfig {
        &self.config
    }

    /// Reads one document. Missing documents yield `NotFound`.
    pub async fn read<T: SerializableDocument>(
        &self,
        partition: &str,
        document_id: &str,
        document_type: DocumentType<T>,
    ) -> Document<T> {
        self.run("read", partition, Some(document_id), |resolved| {
            self.try_read(resolved, document_id, &document_type)
        })
        .await
        .into()
    }

    /// First page of `partition` with the configured page size.
    pub async fn list<T: SerializableDocument>(
        &self,
        partition: &str,
        document_type: DocumentType<T>,
    ) -> Documents<T> {
        self.list_page(partition, document_type, ListOptions::default()).await
    }

    /// One page of `partition`. A `page_size` override must lie in
    /// `1..=MAX_PAGE_SIZE`, like the configured one.
    pub async fn list_page<T: SerializableDocument>(
        &self,
        partition: &str,
        document_type: DocumentType<T>,
        options: ListOptions,
    ) -> Documents<T> {
        self.run("list", partition, None, |resolved| async move {
            self.try_list(&resolved, &document_type, options).await
        })
        .await
        .into()
    }

    /// Follows continuation tokens until the last page and returns everything
    /// as a single page. Stops at the first page that fails, and fails when
    /// the store hands out a token without making progress.
    pub async fn list_all<T: SerializableDocument>(
        &self,
        partition: &str,
        document_type: DocumentType<T>,
    ) -> Documents<T> {
        self.run("list_all", partition, None, |resolved| async move {
            self.try_list_all(&resolved, &document_type).await
        })
        .await
        .into()
    }

    /// Creates a document. Fails with `Conflict` if the id is taken.
    ///
    /// The stored copy echoed by the store is decoded back with serde. A type
    /// whose serialized form does not deserialize into `T` gets
    /// `DeserializationError` even though the write was applied.
    pub async fn create<T: SerializableDocument>(
        &self,
        partition: &str,
        document_id: &str,
        document: &T,
    ) -> Document<T> {
        self.run("create", partition, Some(document_id), |resolved| {
            self.try_create(resolved, document_id, document)
        })
        .await
        .into()
    }

    /// Replaces an existing document. Fails with `NotFound` if it does not exist.
    /// The stored copy is decoded back the same way as for [`DataStorage::create`].
    pub async fn replace<T: SerializableDocument>(
        &self,
        partition: &str,
        document_id: &str,
        document: &T,
    ) -> Document<T> {
        self.run("replace", partition, Some(document_id), |resolved| {
            self.try_replace(resolved, document_id, document, None)
        })
        .await
        .into()
    }

    /// Replaces a document only if its current version token is `etag`;
    /// otherwise fails with `VersionConflict`.
    pub async fn replace_if_match<T: SerializableDocument>(
        &self,
        partition: &str,
        document_id: &str,
        document: &T,
        etag: &str,
    ) -> Document<T> {
        self.run("replace", partition, Some(document_id), |resolved| {
            self.try_replace(resolved, document_id, document, Some(etag))
        })
        .await
        .into()
    }

    /// Deletes a document. Deleting a missing document yields `NotFound`,
    /// including the second delete of the same id.
    pub async fn delete(&self, partition: &str, document_id: &str) -> Result<()> {
        self.run("delete", partition, Some(document_id), |resolved| {
            self.try_delete(resolved, document_id)
        })
        .await
    }

    /// Validates the id, resolves the partition once and runs `f`
    /// against it. The outcome is logged under the resolved partition name.
    async fn run<R, F, Fut>(
        &self,
        operation: &str,
        partition: &str,
        document_id: Option<&str>,
        f: F,
    ) -> Result<R>
    where
        F: FnOnce(ResolvedPartition) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let resolved = document_id
            .map_or(Ok(()), validate_document_id)
            .and_then(|_| self.resolver.resolve(partition));
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                log_outcome(operation, partition, document_id, Some(&e));
                return Err(e);
            }
        };

        let name = resolved.name().to_string();
        let result = f(resolved).await;
        log_outcome(operation, &name, document_id, result.as_ref().err());
        result
    }

    async fn try_read<T: SerializableDocument>(
        &self,
        partition: ResolvedPartition,
        document_id: &str,
        document_type: &DocumentType<T>,
    ) -> Result<StoredDocument<T>> {
        let request =
            TransportRequest::new(Method::Get, partition.name()).with_document_id(document_id);
        let response = self.dispatch(request).await?;
        let body = expect_success(response, partition.name(), Some(document_id))?.body;

        let payload = body.ok_or_else(|| {
            DataStorageError::deserialization("store returned an empty document", serde_json::Value::Null)
        })?;
        codec::decode_wrapper(payload, document_type)
    }

    async fn try_list<T: SerializableDocument>(
        &self,
        partition: &ResolvedPartition,
        document_type: &DocumentType<T>,
        options: ListOptions,
    ) -> Result<Page<T>> {
        let page_size = match options.page_size {
            Some(size) if size == 0 || size > MAX_PAGE_SIZE => {
                return Err(DataStorageError::InvalidArgument(format!(
                    "page size {} is outside 1..={}",
                    size, MAX_PAGE_SIZE
                )));
            }
            Some(size) => size,
            None => self.config.page_size,
        };

        let request = TransportRequest::new(Method::Get, partition.name())
            .with_page(Some(page_size), options.continuation_token);
        let response = expect_success(self.dispatch(request).await?, partition.name(), None)?;

        let payload = response.body.unwrap_or(serde_json::Value::Null);
        let list = match DocumentList::deserialize(&payload) {
            Ok(list) => list,
            Err(source) => return Err(DataStorageError::Deserialization { source, payload }),
        };

        let items = list
            .documents
            .into_iter()
            .map(|item| codec::decode_wrapper(item, document_type).into())
            .collect();

        Ok(Page {
            items,
            continuation_token: response.continuation_token,
        })
    }

    async fn try_list_all<T: SerializableDocument>(
        &self,
        partition: &ResolvedPartition,
        document_type: &DocumentType<T>,
    ) -> Result<Page<T>> {
        let mut items = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut options = ListOptions::default();

        loop {
            let page = self.try_list(partition, document_type, options).await?;
            let Some(next) = page.next_options(None) else {
                items.extend(page.items);
                break;
            };

            // An empty page or a repeated token would loop forever.
            let token = next.continuation_token.clone().unwrap_or_default();
            if page.is_empty() || !seen_tokens.insert(token.clone()) {
                return Err(TransportError::InvalidResponse(format!(
                    "store returned continuation token '{}' without making progress",
                    token
                ))
                .into());
            }
            items.extend(page.items);
            options = next;
        }

        tracing::debug!("list_all {}: {} documents", partition.name(), items.len());
        Ok(Page {
            items,
            continuation_token: None,
        })
    }

    async fn try_create<T: SerializableDocument>(
        &self,
        partition: ResolvedPartition,
        document_id: &str,
        document: &T,
    ) -> Result<StoredDocument<T>> {
        partition.ensure_writable()?;
        let body = codec::encode_wrapper(partition.name(), document_id, document)?;

        let request = TransportRequest::new(Method::Post, partition.name()).with_body(body);
        let response = self.dispatch(request).await?;
        self.decode_written(response, partition.name(), document_id)
    }

    async fn try_replace<T: SerializableDocument>(
        &self,
        partition: ResolvedPartition,
        document_id: &str,
        document: &T,
        etag: Option<&str>,
    ) -> Result<StoredDocument<T>> {
        partition.ensure_writable()?;
        let body = codec::encode_wrapper(partition.name(), document_id, document)?;

        let request = TransportRequest::new(Method::Put, partition.name())
            .with_document_id(document_id)
            .with_body(body)
            .with_if_match(etag.map(str::to_string));
        let response = self.dispatch(request).await?;
        self.decode_written(response, partition.name(), document_id)
    }

    async fn try_delete(&self, partition: ResolvedPartition, document_id: &str) -> Result<()> {
        partition.ensure_writable()?;

        let request =
            TransportRequest::new(Method::Delete, partition.name()).with_document_id(document_id);
        let response = self.dispatch(request).await?;
        expect_success(response, partition.name(), Some(document_id))?;
        Ok(())
    }

    fn decode_written<T: SerializableDocument>(
        &self,
        response: TransportResponse,
        partition: &str,
        document_id: &str,
    ) -> Result<StoredDocument<T>> {
        let body = expect_success(response, partition, Some(document_id))?.body;
        let payload = body.ok_or_else(|| {
            DataStorageError::deserialization(
                "store acknowledged the write without returning the document",
                serde_json::Value::Null,
            )
        })?;
        codec::decode_wrapper(payload, &DocumentType::<T>::new())
    }

    async fn dispatch(&self, request: TransportRequest) -> Result<TransportResponse> {
        tracing::debug!(
            "Dispatching {} partition={} id={:?} request_id={}",
            request.method,
            request.partition,
            request.document_id,
            request.request_id
        );
        let response = self.transport.send(request).await?;
        Ok(response)
    }
}

/// Maps a non-success status to the matching error; passes successes through.
fn expect_success(
    response: TransportResponse,
    partition: &str,
    document_id: Option<&str>,
) -> Result<TransportResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let partition = partition.to_string();
    let id = document_id.unwrap_or_default().to_string();
    let error = match response.status {
        404 => DataStorageError::NotFound { partition, id },
        409 => DataStorageError::Conflict { partition, id },
        412 => DataStorageError::VersionConflict { partition, id },
        401 | 403 => DataStorageError::Unauthorized {
            status: response.status,
        },
        status => DataStorageError::Server {
            status,
            message: error_message(response.body.as_ref())
                .unwrap_or_else(|| "no error message".to_string()),
        },
    };
    Err(error)
}

fn log_outcome(
    operation: &str,
    partition: &str,
    document_id: Option<&str>,
    error: Option<&DataStorageError>,
) {
    match error {
        None => tracing::debug!(
            "{} {} {} completed",
            operation,
            partition,
            document_id.unwrap_or("*")
        ),
        Some(e) if matches!(e, DataStorageError::Transport(_) | DataStorageError::Server { .. }) => {
            tracing::error!(
                "{} {} {} failed: {}",
                operation,
                partition,
                document_id.unwrap_or("*"),
                e
            )
        }
        Some(e) => tracing::warn!(
            "{} {} {} failed: {}",
            operation,
            partition,
            document_id.unwrap_or("*"),
            e
        ),
    }
}
