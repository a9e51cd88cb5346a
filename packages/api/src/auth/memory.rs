use std::collections::HashMap;
use std::sync::Mutex;

use store::Identity;

use super::{AuthError, IdentityCell, IdentityProvider, IdentityWatch};

/// In-memory IdentityProvider for testing and offline use.
#[derive(Debug)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Identity>>,
    identity: IdentityCell,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            identity: IdentityCell::new(None),
        }
    }

    /// Start already signed in as `identity`.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            identity: IdentityCell::new(Some(identity)),
        }
    }

    /// Accept `id_token` as a valid token for `identity`.
    pub fn with_account(self, id_token: impl Into<String>, identity: Identity) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(id_token.into(), identity);
        self
    }
}

impl IdentityProvider for MemoryIdentity {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.current()
    }

    fn subscribe(&self) -> IdentityWatch {
        self.identity.subscribe()
    }

    async fn exchange_token(&self, id_token: &str) -> Result<Identity, AuthError> {
        let identity = self
            .accounts
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or_else(|| AuthError::Rejected("invalid or expired token".to_string()))?;
        self.identity.set(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) {
        self.identity.set(None);
    }
}
