use super::identity::IdentityProvider;
use crate::error::{DataStorageError, Result};
use std::sync::Arc;

/// User partition template. An authenticated user can read and write documents here.
pub const USER_PARTITION: &str = "user-{}";

/// Shared partition everyone can read. Writes are not allowed through this client.
pub const READONLY_PARTITION: &str = "readonly";

const USER_PARTITION_PREFIX: &str = "user-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

/// A concrete partition name plus whether the client may write to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPartition {
    name: String,
    access: AccessMode,
}

impl ResolvedPartition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn is_read_only(&self) -> bool {
        self.access == AccessMode::ReadOnly
    }

    pub fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(DataStorageError::WriteNotAllowed {
                partition: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Resolves `partition` against a snapshot of the current user id.
///
/// Pure: no I/O, output depends only on the two inputs.
pub fn resolve_partition(partition: &str, user_id: Option<&str>) -> Result<ResolvedPartition> {
    if partition.is_empty() {
        return Err(DataStorageError::InvalidArgument(
            "partition must not be empty".to_string(),
        ));
    }

    match partition {
        USER_PARTITION => match user_id {
            Some(id) if !id.is_empty() => Ok(ResolvedPartition {
                name: format!("{}{}", USER_PARTITION_PREFIX, id),
                access: AccessMode::ReadWrite,
            }),
            _ => Err(DataStorageError::IdentityUnavailable),
        },
        READONLY_PARTITION => Ok(ResolvedPartition {
            name: partition.to_string(),
            access: AccessMode::ReadOnly,
        }),
        _ => Ok(ResolvedPartition {
            name: partition.to_string(),
            access: AccessMode::ReadWrite,
        }),
    }
}

#[derive(Clone)]
pub struct PartitionResolver {
    identity: Arc<dyn IdentityProvider>,
}

impl PartitionResolver {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub fn resolve(&self, partition: &str) -> Result<ResolvedPartition> {
        // Only the user template needs the identity.
        if partition == USER_PARTITION {
            let user_id = self.identity.current_user_id();
            return resolve_partition(partition, user_id.as_deref());
        }
        resolve_partition(partition, None)
    }
}
