//! # Identity adapter
//!
//! Wraps the external authentication provider behind [`IdentityProvider`]. The
//! native Google sign-in flow happens elsewhere and hands us an ID token; the
//! provider exchanges it for an [`Identity`] and publishes the result on a
//! `tokio::sync::watch` channel so controllers can read the current user
//! without being able to change it.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`FirebaseAuth`] | Firebase Identity Toolkit REST API (`accounts:signInWithIdp`) |
//! | [`MemoryIdentity`] | Fixed token → identity table, for tests and offline use |

mod config;
mod firebase;
mod memory;

use std::future::Future;

use store::Identity;
use thiserror::Error;
use tokio::sync::watch;

pub use config::FirebaseConfig;
pub use firebase::FirebaseAuth;
pub use memory::MemoryIdentity;

/// Read-only view of the signed-in user.
pub type IdentityWatch = watch::Receiver<Option<Identity>>;

/// Failure exchanging an ID token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider refused the token (invalid, expired, wrong audience).
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error("network failure: {0}")]
    Network(String),
}

/// Async trait over the authentication provider.
pub trait IdentityProvider {
    /// The signed-in user, if any.
    fn current_identity(&self) -> Option<Identity>;
    /// Subscribe to identity changes.
    fn subscribe(&self) -> IdentityWatch;
    /// Exchange a Google ID token for a signed-in identity.
    fn exchange_token(
        &self,
        id_token: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>>;
    fn sign_out(&self);
}

/// Shared holder for the current identity. Only providers write to it.
#[derive(Debug)]
struct IdentityCell {
    tx: watch::Sender<Option<Identity>>,
}

impl IdentityCell {
    fn new(initial: Option<Identity>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> IdentityWatch {
        self.tx.subscribe()
    }

    fn set(&self, identity: Option<Identity>) {
        self.tx.send_replace(identity);
    }
}
