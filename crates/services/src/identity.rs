use std::sync::{Arc, Mutex};

use recall_core::model::UserId;

/// Source of the currently signed-in user's identity.
///
/// The store reads the identity at reaction and mutation time rather than
/// caching it, so a sign-out between calls is observed immediately.
pub trait IdentitySource: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// Clonable identity handle with switchable state, for embedding
/// applications and tests.
#[derive(Clone, Default)]
pub struct SharedIdentity {
    user: Arc<Mutex<Option<UserId>>>,
}

impl SharedIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that starts signed in as the given user.
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        let identity = Self::new();
        identity.sign_in(user);
        identity
    }

    pub fn sign_in(&self, user: UserId) {
        if let Ok(mut guard) = self.user.lock() {
            *guard = Some(user);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.user.lock() {
            *guard = None;
        }
    }
}

impl IdentitySource for SharedIdentity {
    fn current_user(&self) -> Option<UserId> {
        // A poisoned lock still holds the last written identity.
        match self.user.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
