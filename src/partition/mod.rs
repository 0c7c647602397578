//! Partition Module
//!
//! Maps the partition key a caller passes in to the concrete partition used by
//! the backing store.
//!
//! ## Reserved Partitions
//! - **User partition** ([`USER_PARTITION`]): templated, resolved at call time to
//!   `user-<userId>` from the current authenticated identity.
//! - **Read-only partition** ([`READONLY_PARTITION`]): shared by everyone, tagged
//!   write-disabled so writes fail before reaching the network.
//!
//! Any other key is an opaque, caller-defined partition and passes through unchanged.

pub mod identity;
pub mod resolver;

pub use identity::{IdentityProvider, SharedIdentity, StaticIdentity};
pub use resolver::{
    AccessMode, PartitionResolver, READONLY_PARTITION, ResolvedPartition, USER_PARTITION,
    resolve_partition,
};

#[cfg(test)]
mod tests;
