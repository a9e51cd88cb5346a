use std::sync::Arc;

use api::{IdentityProvider, IdentityWatch};
use store::Identity;
use tokio::sync::watch;

/// What the sign-in screen renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub loading: bool,
    pub user: Option<Identity>,
    pub error: Option<String>,
}

/// Drives Google sign-in through an [`IdentityProvider`].
pub struct AuthController<P: IdentityProvider> {
    provider: Arc<P>,
    state: watch::Sender<AuthState>,
}

impl<P: IdentityProvider> AuthController<P> {
    pub fn new(provider: Arc<P>) -> Self {
        let (state, _) = watch::channel(AuthState {
            user: provider.current_identity(),
            ..AuthState::default()
        });
        Self { provider, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Read-only identity for the other controllers.
    pub fn identity(&self) -> IdentityWatch {
        self.provider.subscribe()
    }

    /// Exchange a Google ID token obtained by the native sign-in UI.
    ///
    /// A failed exchange signs out any previous identity.
    pub async fn sign_in_with_google(&self, id_token: &str) -> bool {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.provider.exchange_token(id_token).await {
            Ok(identity) => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.user = Some(identity);
                });
                true
            }
            Err(e) => {
                tracing::error!("sign-in failed: {}", e);
                self.provider.sign_out();
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.user = None;
                    s.error = Some(e.to_string());
                });
                false
            }
        }
    }

    pub fn sign_out(&self) {
        self.provider.sign_out();
        self.state.send_modify(|s| {
            s.user = None;
            s.error = None;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryIdentity;

    fn ada() -> Identity {
        Identity {
            uid: "u1".to_string(),
            display_name: Some("Ada".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sign_in_publishes_identity() {
        let auth = AuthController::new(Arc::new(MemoryIdentity::new().with_account("tok", ada())));
        let identity = auth.identity();
        assert!(auth.snapshot().user.is_none());

        assert!(auth.sign_in_with_google("tok").await);
        let state = auth.snapshot();
        assert!(!state.loading);
        assert_eq!(state.user, Some(ada()));
        assert_eq!(*identity.borrow(), Some(ada()));
    }

    #[tokio::test]
    async fn test_rejected_token() {
        let auth = AuthController::new(Arc::new(MemoryIdentity::new()));

        assert!(!auth.sign_in_with_google("bogus").await);
        let state = auth.snapshot();
        assert!(!state.loading);
        assert!(state.user.is_none());
        assert!(state.error.unwrap().contains("rejected"));
    }

    #[tokio::test]
    async fn test_failed_sign_in_drops_previous_identity() {
        let auth = AuthController::new(Arc::new(MemoryIdentity::signed_in(ada())));
        let identity = auth.identity();
        assert_eq!(*identity.borrow(), Some(ada()));

        assert!(!auth.sign_in_with_google("bogus").await);
        assert!(auth.snapshot().user.is_none());
        assert!(identity.borrow().is_none());
    }

    #[tokio::test]
    async fn test_sign_out() {
        let auth = AuthController::new(Arc::new(MemoryIdentity::signed_in(ada())));
        assert_eq!(auth.snapshot().user, Some(ada()));

        auth.sign_out();
        assert!(auth.snapshot().user.is_none());
        assert!(auth.identity().borrow().is_none());
    }
}
