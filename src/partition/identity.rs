use std::sync::{Arc, RwLock};

/// Source of the authenticated user id, owned and mutated outside this crate.
///
/// The resolver reads it once per operation and treats the value as a snapshot.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Identity that never changes. `anonymous()` models a signed-out client.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

/// Identity updated by the sign-in flow while clients keep reading it.
///
/// Clones share the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentity {
    user_id: Arc<RwLock<Option<String>>>,
}

impl SharedIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let mut slot = self.user_id.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(user_id.into());
        tracing::debug!("Identity signed in");
    }

    pub fn sign_out(&self) {
        let mut slot = self.user_id.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        tracing::debug!("Identity signed out");
    }
}

impl IdentityProvider for SharedIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
