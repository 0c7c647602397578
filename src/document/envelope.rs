use crate::error::{DataStorageError, ErrorKind, Result};

/// A document as stored, with the store's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument<T> {
    pub value: T,
    pub partition: String,
    pub id: String,
    /// Version token for optimistic concurrency on replace.
    pub etag: Option<String>,
    /// Last write time, seconds since the Unix epoch.
    pub last_updated: Option<i64>,
}

/// Outcome of a single-document operation: a stored document or an error, never both.
#[derive(Debug)]
pub struct Document<T> {
    inner: Result<StoredDocument<T>>,
}

impl<T> Document<T> {
    pub fn ok(stored: StoredDocument<T>) -> Self {
        Self { inner: Ok(stored) }
    }

    pub fn err(error: DataStorageError) -> Self {
        Self { inner: Err(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.inner.is_ok()
    }

    pub fn is_err(&self) -> bool {
        self.inner.is_err()
    }

    pub fn stored(&self) -> Option<&StoredDocument<T>> {
        self.inner.as_ref().ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.stored().map(|stored| &stored.value)
    }

    pub fn id(&self) -> Option<&str> {
        self.stored().map(|stored| stored.id.as_str())
    }

    pub fn partition(&self) -> Option<&str> {
        self.stored().map(|stored| stored.partition.as_str())
    }

    pub fn etag(&self) -> Option<&str> {
        self.stored().and_then(|stored| stored.etag.as_deref())
    }

    pub fn error(&self) -> Option<&DataStorageError> {
        self.inner.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(DataStorageError::kind)
    }

    pub fn into_result(self) -> Result<StoredDocument<T>> {
        self.inner
    }

    pub fn into_value(self) -> Result<T> {
        self.inner.map(|stored| stored.value)
    }

    pub fn map<U, F>(self, f: F) -> Document<U>
    where
        F: FnOnce(T) -> U,
    {
        Document {
            inner: self.inner.map(|stored| StoredDocument {
                value: f(stored.value),
                partition: stored.partition,
                id: stored.id,
                etag: stored.etag,
                last_updated: stored.last_updated,
            }),
        }
    }
}

impl<T> From<Result<StoredDocument<T>>> for Document<T> {
    fn from(inner: Result<StoredDocument<T>>) -> Self {
        Self { inner }
    }
}

/// Options for one list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Overrides the client's default page size.
    pub page_size: Option<u32>,
    /// Token from the previous page; `None` starts from the beginning.
    pub continuation_token: Option<String>,
}

impl ListOptions {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: Some(page_size),
            continuation_token: None,
        }
    }
}

/// One page of a partition listing.
///
/// Each item decodes independently, so one malformed document yields an error
/// item without hiding the rest of the page.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<Document<T>>,
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// Options for the page after this one, keeping `page_size`.
    /// `None` when this was the last page.
    pub fn next_options(&self, page_size: Option<u32>) -> Option<ListOptions> {
        self.continuation_token
            .as_ref()
            .map(|token| ListOptions {
                page_size,
                continuation_token: Some(token.clone()),
            })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Successfully decoded values, skipping error items.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(Document::value)
    }
}

/// Outcome of a list operation: a page or an error, never both.
#[derive(Debug)]
pub struct Documents<T> {
    inner: Result<Page<T>>,
}

impl<T> Documents<T> {
    pub fn ok(page: Page<T>) -> Self {
        Self { inner: Ok(page) }
    }

    pub fn err(error: DataStorageError) -> Self {
        Self { inner: Err(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.inner.is_ok()
    }

    pub fn page(&self) -> Option<&Page<T>> {
        self.inner.as_ref().ok()
    }

    pub fn items(&self) -> Option<&[Document<T>]> {
        self.page().map(|page| page.items.as_slice())
    }

    pub fn continuation_token(&self) -> Option<&str> {
        self.page().and_then(|page| page.continuation_token.as_deref())
    }

    pub fn error(&self) -> Option<&DataStorageError> {
        self.inner.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(DataStorageError::kind)
    }

    pub fn into_result(self) -> Result<Page<T>> {
        self.inner
    }
}

impl<T> From<Result<Page<T>>> for Documents<T> {
    fn from(inner: Result<Page<T>>) -> Self {
        Self { inner }
    }
}
