//! Partition Module Tests
//!
//! Covers the three resolution paths (user template, read-only literal, custom
//! pass-through) and the identity snapshot behavior.

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::partition::*;
    use std::sync::Arc;

    // ============================================================
    // PURE RESOLUTION
    // ============================================================

    #[test]
    fn test_custom_partitions_pass_through() {
        for partition in ["orders", "user-7", "readonly-archive", "USER-{}", "a b c", "user-"] {
            let resolved = resolve_partition(partition, Some("42")).unwrap();
            assert_eq!(resolved.name(), partition);
            assert_eq!(resolved.access(), AccessMode::ReadWrite);

            let anonymous = resolve_partition(partition, None).unwrap();
            assert_eq!(anonymous.name(), partition);
        }
    }

    #[test]
    fn test_user_partition_uses_identity() {
        let resolved = resolve_partition(USER_PARTITION, Some("42")).unwrap();
        assert_eq!(resolved.name(), "user-42");
        assert!(!resolved.is_read_only());
    }

    #[test]
    fn test_user_partition_without_identity_fails() {
        let err = resolve_partition(USER_PARTITION, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentityUnavailable);

        let err = resolve_partition(USER_PARTITION, Some("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentityUnavailable);
    }

    #[test]
    fn test_readonly_partition_is_tagged() {
        let resolved = resolve_partition(READONLY_PARTITION, Some("42")).unwrap();
        assert_eq!(resolved.name(), "readonly");
        assert!(resolved.is_read_only());

        let err = resolved.ensure_writable().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteNotAllowed);
    }

    #[test]
    fn test_empty_partition_rejected() {
        let err = resolve_partition("", Some("42")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    // ============================================================
    // RESOLVER + IDENTITY PROVIDERS
    // ============================================================

    #[test]
    fn test_resolver_with_static_identity() {
        let resolver = PartitionResolver::new(Arc::new(StaticIdentity::new("alice")));
        assert_eq!(resolver.resolve(USER_PARTITION).unwrap().name(), "user-alice");
        assert_eq!(resolver.resolve("shared").unwrap().name(), "shared");
    }

    #[test]
    fn test_resolver_with_anonymous_identity() {
        let resolver = PartitionResolver::new(Arc::new(StaticIdentity::anonymous()));
        assert_eq!(
            resolver.resolve(USER_PARTITION).unwrap_err().kind(),
            ErrorKind::IdentityUnavailable
        );
        // Non-user partitions never need an identity
        assert!(resolver.resolve(READONLY_PARTITION).is_ok());
    }

    #[test]
    fn test_shared_identity_snapshot_follows_sign_in() {
        let identity = SharedIdentity::new();
        let resolver = PartitionResolver::new(Arc::new(identity.clone()));

        assert!(resolver.resolve(USER_PARTITION).is_err());

        identity.sign_in("bob");
        assert_eq!(resolver.resolve(USER_PARTITION).unwrap().name(), "user-bob");

        identity.sign_in("carol");
        assert_eq!(resolver.resolve(USER_PARTITION).unwrap().name(), "user-carol");

        identity.sign_out();
        assert_eq!(
            resolver.resolve(USER_PARTITION).unwrap_err().kind(),
            ErrorKind::IdentityUnavailable
        );
    }
}
