use super::envelope::StoredDocument;
use crate::error::{DataStorageError, Result};
use crate::transport::protocol::DocumentWrapper;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability required of application documents: JSON in, JSON out.
pub trait SerializableDocument: Serialize + DeserializeOwned {}

impl<T: Serialize + DeserializeOwned> SerializableDocument for T {}

pub type Decoder<T> = fn(&Value) -> serde_json::Result<T>;

/// Per-call descriptor of the document type `T`.
///
/// Carries the decoder as a plain function value. The default one is serde;
/// [`DocumentType::with_decoder`] swaps in a custom one, e.g. to accept a
/// legacy payload shape.
pub struct DocumentType<T> {
    decoder: Decoder<T>,
}

impl<T: DeserializeOwned> DocumentType<T> {
    pub fn new() -> Self {
        Self {
            decoder: decode_with_serde::<T>,
        }
    }
}

impl<T> DocumentType<T> {
    pub fn with_decoder(decoder: Decoder<T>) -> Self {
        Self { decoder }
    }

    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T: DeserializeOwned> Default for DocumentType<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for DocumentType<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DocumentType<T> {}

impl<T> std::fmt::Debug for DocumentType<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentType")
            .field("type", &self.type_name())
            .finish()
    }
}

fn decode_with_serde<T: DeserializeOwned>(value: &Value) -> serde_json::Result<T> {
    T::deserialize(value)
}

pub fn encode<T: Serialize + ?Sized>(document: &T) -> Result<Value> {
    serde_json::to_value(document).map_err(DataStorageError::Serialization)
}

pub fn decode<T>(value: Value, document_type: &DocumentType<T>) -> Result<T> {
    match (document_type.decoder)(&value) {
        Ok(document) => Ok(document),
        Err(source) => Err(DataStorageError::Deserialization {
            source,
            payload: value,
        }),
    }
}

/// Encodes `document` into the store's wire shape for `(partition, id)`.
pub fn encode_wrapper<T: Serialize + ?Sized>(partition: &str, id: &str, document: &T) -> Result<Value> {
    let wrapper = DocumentWrapper {
        id: id.to_string(),
        partition: partition.to_string(),
        document: encode(document)?,
        etag: None,
        timestamp: None,
    };
    serde_json::to_value(wrapper).map_err(DataStorageError::Serialization)
}

/// Decodes a stored document as returned by the store.
///
/// A payload that is not a stored document at all is reported with the whole
/// payload; a document that does not fit `T` is reported with its inner body.
pub fn decode_wrapper<T>(payload: Value, document_type: &DocumentType<T>) -> Result<StoredDocument<T>> {
    let wrapper = match DocumentWrapper::deserialize(&payload) {
        Ok(wrapper) => wrapper,
        Err(source) => return Err(DataStorageError::Deserialization { source, payload }),
    };

    let value = decode(wrapper.document, document_type)?;
    Ok(StoredDocument {
        value,
        partition: wrapper.partition,
        id: wrapper.id,
        etag: wrapper.etag,
        last_updated: wrapper.timestamp,
    })
}
