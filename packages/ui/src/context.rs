//! Controller wiring and Dioxus hooks.
//!
//! The app root calls [`use_controllers_provider`] once. Screens below it call
//! [`use_controllers`] for actions and the `use_*_state` hooks for a `Signal`
//! that follows the controller's watch channel.

use std::rc::Rc;
use std::sync::Arc;

use api::auth::FirebaseConfig;
use api::{FirebaseAuth, Gateway, IdentityProvider};
use dioxus::prelude::*;
use store::{Backend, BackendConfig, Repository};
use tokio::sync::watch;

use crate::auth::{AuthController, AuthState};
use crate::feed::{FeedController, FeedState};
use crate::submission::{SubmissionController, SubmissionState};

/// The three controllers, sharing one repository and one identity source.
pub struct Controllers<B: Backend, P: IdentityProvider> {
    pub auth: AuthController<P>,
    pub feed: FeedController<B>,
    pub submission: SubmissionController<B>,
}

/// Controllers talking to the hosted backend.
pub type RemoteControllers = Controllers<Gateway, FirebaseAuth>;

impl<B: Backend, P: IdentityProvider> Controllers<B, P> {
    pub fn new(repo: Repository<B>, provider: P) -> Self {
        let repo = Arc::new(repo);
        let auth = AuthController::new(Arc::new(provider));
        let identity = auth.identity();
        Self {
            feed: FeedController::new(repo.clone(), identity.clone()),
            submission: SubmissionController::new(repo, identity),
            auth,
        }
    }
}

impl RemoteControllers {
    pub fn remote(backend: BackendConfig, firebase: FirebaseConfig) -> Self {
        Self::new(api::remote_repository(backend), FirebaseAuth::new(firebase))
    }
}

/// Provide controllers to the tree below the caller and load the feed once.
pub fn use_controllers_provider<B, P>(
    init: impl FnOnce() -> Controllers<B, P>,
) -> Rc<Controllers<B, P>>
where
    B: Backend + 'static,
    P: IdentityProvider + 'static,
{
    let controllers = use_context_provider(|| Rc::new(init()));
    let loader = controllers.clone();
    use_future(move || {
        let controllers = loader.clone();
        async move { controllers.feed.refresh_reports().await }
    });
    controllers
}

/// Consume the controllers provided by [`use_controllers_provider`].
pub fn use_controllers<B, P>() -> Rc<Controllers<B, P>>
where
    B: Backend + 'static,
    P: IdentityProvider + 'static,
{
    use_context::<Rc<Controllers<B, P>>>()
}

/// Mirror a watch channel into a signal for rendering.
///
/// Only the receiver passed on the first render is used.
pub fn use_watch<T: Clone + 'static>(rx: watch::Receiver<T>) -> Signal<T> {
    let mut value = use_signal(|| rx.borrow().clone());
    use_future(move || {
        let mut rx = rx.clone();
        async move {
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                value.set(next);
            }
        }
    });
    value
}

pub fn use_feed_state<B, P>() -> Signal<FeedState>
where
    B: Backend + 'static,
    P: IdentityProvider + 'static,
{
    use_watch(use_controllers::<B, P>().feed.subscribe())
}

pub fn use_submission_state<B, P>() -> Signal<SubmissionState>
where
    B: Backend + 'static,
    P: IdentityProvider + 'static,
{
    use_watch(use_controllers::<B, P>().submission.subscribe())
}

pub fn use_auth_state<B, P>() -> Signal<AuthState>
where
    B: Backend + 'static,
    P: IdentityProvider + 'static,
{
    use_watch(use_controllers::<B, P>().auth.subscribe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryIdentity;
    use store::{Identity, MemoryBackend};

    #[tokio::test]
    async fn test_controllers_share_identity() {
        let backend = MemoryBackend::default();
        let provider = MemoryIdentity::new().with_account(
            "tok",
            Identity {
                uid: "u7".to_string(),
                display_name: None,
            },
        );
        let controllers = Controllers::new(Repository::new(backend.clone(), "reports"), provider);

        controllers.submission.select_category("Harassment");
        controllers.submission.set_description("shouting at the station");
        assert!(!controllers.submission.submit_report().await);

        assert!(controllers.auth.sign_in_with_google("tok").await);
        assert!(controllers.submission.submit_report().await);

        controllers.feed.load_my_reports().await;
        let mine = controllers.feed.snapshot().my_reports;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id.as_deref(), Some("u7"));
    }
}
