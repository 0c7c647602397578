//! Partitioned Document Storage Client
//!
//! A typed CRUD client for a remote, partitioned JSON document store. Callers
//! work with their own serde types; the crate takes care of partition
//! resolution, the wire format and result envelopes.
//!
//! ## Architecture Modules
//! The client is composed of six loosely coupled parts:
//!
//! - **`config`**: Endpoint coordinates and transport tuning, loaded from defaults,
//!   a JSON file, or `DATA_STORAGE_*` environment variables.
//! - **`document`**: The document codec (`T` <-> stored JSON) and the envelopes
//!   (`Document<T>`, `Documents<T>`) every operation hands back.
//! - **`error`**: The error taxonomy shared by all operations.
//! - **`partition`**: Resolves the user-partition template and the read-only
//!   partition against the current identity.
//! - **`storage`**: The `DataStorage` dispatcher exposing read, list, create,
//!   replace and delete, as async methods and as completion callbacks.
//! - **`transport`**: The network seam. Ships a `reqwest` HTTP transport with
//!   retry/backoff and an in-memory store for tests.

pub mod config;
pub mod document;
pub mod error;
pub mod partition;
pub mod storage;
pub mod transport;

pub use config::DataStorageConfig;
pub use document::{Document, DocumentType, Documents, ListOptions, Page, StoredDocument};
pub use error::{DataStorageError, ErrorKind, Result, TransportError};
pub use partition::{
    IdentityProvider, READONLY_PARTITION, SharedIdentity, StaticIdentity, USER_PARTITION,
};
pub use storage::DataStorage;
