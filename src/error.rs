//! Error Taxonomy
//!
//! Every operation of the client reports failures through [`DataStorageError`].
//! Local checks (identity, read-only guard, argument validation) short-circuit
//! before the transport is touched; everything else is wrapped from the remote
//! call or from the codec.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataStorageError>;

/// Flat classification of a [`DataStorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IdentityUnavailable,
    WriteNotAllowed,
    NotFound,
    Conflict,
    VersionConflict,
    SerializationError,
    DeserializationError,
    TransportError,
    InvalidArgument,
    Unauthorized,
    ServerError,
}

#[derive(Debug, Error)]
pub enum DataStorageError {
    #[error("no authenticated user is available to resolve the user partition")]
    IdentityUnavailable,

    #[error("writes are not allowed in partition '{partition}'")]
    WriteNotAllowed { partition: String },

    #[error("document '{id}' not found in partition '{partition}'")]
    NotFound { partition: String, id: String },

    #[error("document '{id}' already exists in partition '{partition}'")]
    Conflict { partition: String, id: String },

    #[error("document '{id}' in partition '{partition}' has changed since the supplied version")]
    VersionConflict { partition: String, id: String },

    #[error("failed to serialize document: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The payload did not match the target document type.
    /// `payload` is the raw JSON that failed to decode.
    #[error("failed to deserialize document: {source}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        payload: Value,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("request rejected by the store (status {status})")]
    Unauthorized { status: u16 },

    #[error("store returned status {status}: {message}")]
    Server { status: u16, message: String },
}

impl DataStorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IdentityUnavailable => ErrorKind::IdentityUnavailable,
            Self::WriteNotAllowed { .. } => ErrorKind::WriteNotAllowed,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::Serialization(_) => ErrorKind::SerializationError,
            Self::Deserialization { .. } => ErrorKind::DeserializationError,
            Self::Transport(_) => ErrorKind::TransportError,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Server { .. } => ErrorKind::ServerError,
        }
    }

    /// Raw payload of a failed decode, kept for diagnostics.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Deserialization { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub(crate) fn deserialization(message: impl std::fmt::Display, payload: Value) -> Self {
        Self::Deserialization {
            source: <serde_json::Error as serde::de::Error>::custom(message),
            payload,
        }
    }
}

/// Failures reported by the network collaborator. Passed through as-is.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
