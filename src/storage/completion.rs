//! Callback-style entry points.
//!
//! Each `*_with` method spawns the operation on the current tokio runtime and
//! hands its envelope to `completion` exactly once. Aborting the returned
//! handle discards the result without invoking the completion.

use super::client::DataStorage;
use crate::document::codec::{DocumentType, SerializableDocument};
use crate::document::envelope::{Document, Documents};
use crate::error::Result;

use tokio::task::JoinHandle;

impl DataStorage {
    pub fn read_with<T, F>(
        &self,
        partition: impl Into<String>,
        document_id: impl Into<String>,
        document_type: DocumentType<T>,
        completion: F,
    ) -> JoinHandle<()>
    where
        T: SerializableDocument + Send + 'static,
        F: FnOnce(Document<T>) + Send + 'static,
    {
        let storage = self.clone();
        let partition = partition.into();
        let document_id = document_id.into();
        tokio::spawn(async move {
            let document = storage.read(&partition, &document_id, document_type).await;
            completion(document);
        })
    }

    pub fn list_with<T, F>(
        &self,
        partition: impl Into<String>,
        document_type: DocumentType<T>,
        completion: F,
    ) -> JoinHandle<()>
    where
        T: SerializableDocument + Send + 'static,
        F: FnOnce(Documents<T>) + Send + 'static,
    {
        let storage = self.clone();
        let partition = partition.into();
        tokio::spawn(async move {
            let documents = storage.list(&partition, document_type).await;
            completion(documents);
        })
    }

    pub fn create_with<T, F>(
        &self,
        partition: impl Into<String>,
        document_id: impl Into<String>,
        document: T,
        completion: F,
    ) -> JoinHandle<()>
    where
        T: SerializableDocument + Send + Sync + 'static,
        F: FnOnce(Document<T>) + Send + 'static,
    {
        let storage = self.clone();
        let partition = partition.into();
        let document_id = document_id.into();
        tokio::spawn(async move {
            let stored = storage.create(&partition, &document_id, &document).await;
            completion(stored);
        })
    }

    pub fn replace_with<T, F>(
        &self,
        partition: impl Into<String>,
        document_id: impl Into<String>,
        document: T,
        completion: F,
    ) -> JoinHandle<()>
    where
        T: SerializableDocument + Send + Sync + 'static,
        F: FnOnce(Document<T>) + Send + 'static,
    {
        let storage = self.clone();
        let partition = partition.into();
        let document_id = document_id.into();
        tokio::spawn(async move {
            let stored = storage.replace(&partition, &document_id, &document).await;
            completion(stored);
        })
    }

    /// Completion receives `Ok(())` or the error; there is no payload.
    pub fn delete_with<F>(
        &self,
        partition: impl Into<String>,
        document_id: impl Into<String>,
        completion: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let storage = self.clone();
        let partition = partition.into();
        let document_id = document_id.into();
        tokio::spawn(async move {
            let outcome = storage.delete(&partition, &document_id).await;
            completion(outcome);
        })
    }
}
