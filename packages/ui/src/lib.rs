//! State and actions for the incident reporting screens.
//!
//! Controllers own observable state in `tokio::sync::watch` channels and call
//! the [`store::Repository`] for every network operation. The [`context`]
//! module exposes them to Dioxus components.

pub mod auth;
pub mod context;
pub mod feed;
pub mod submission;
pub mod time;

pub use auth::{AuthController, AuthState};
pub use context::{
    use_auth_state, use_controllers, use_controllers_provider, use_feed_state,
    use_submission_state, use_watch, Controllers, RemoteControllers,
};
pub use feed::{FeedController, FeedState, LoadStatus};
pub use submission::{Draft, Invalid, SubmissionController, SubmissionState, SubmitResult};
pub use time::{format_time_ago, time_ago};
