//! Document Module
//!
//! Everything about the documents themselves: how an application type is
//! marshaled to and from the store's JSON (`codec`), and the envelopes every
//! operation returns (`envelope`).

pub mod codec;
pub mod envelope;

pub use codec::{DocumentType, SerializableDocument};
pub use envelope::{Document, Documents, ListOptions, Page, StoredDocument};

use crate::error::{DataStorageError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Longest document id the store accepts.
pub const MAX_DOCUMENT_ID_LEN: usize = 255;

fn document_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Characters the store reserves in resource paths.
    PATTERN.get_or_init(|| Regex::new(r"^[^/\\?#]+$").expect("document id pattern is valid"))
}

pub fn validate_document_id(document_id: &str) -> Result<()> {
    if document_id.is_empty() {
        return Err(DataStorageError::InvalidArgument(
            "document id must not be empty".to_string(),
        ));
    }
    if document_id.chars().count() > MAX_DOCUMENT_ID_LEN {
        return Err(DataStorageError::InvalidArgument(format!(
            "document id is longer than {} characters",
            MAX_DOCUMENT_ID_LEN
        )));
    }
    if !document_id_pattern().is_match(document_id) {
        return Err(DataStorageError::InvalidArgument(format!(
            "document id '{}' contains one of the reserved characters / \\ ? #",
            document_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
