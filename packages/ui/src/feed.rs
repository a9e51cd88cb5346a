//! # Feed state
//!
//! [`FeedController`] owns everything the feed, incident detail and "my reports"
//! screens render: the report list, the signed-in user's own reports, and
//! per-report comment and vote lists. State lives in a `tokio::sync::watch`
//! channel; screens [`subscribe`](FeedController::subscribe) and re-render on
//! change.
//!
//! ## Collections
//!
//! | Field | Loaded by | On failure |
//! |-------|-----------|------------|
//! | `reports` | [`refresh_reports`](FeedController::refresh_reports) | emptied, status `Failed`, `reports_error` set |
//! | `my_reports` | [`load_my_reports`](FeedController::load_my_reports) | emptied, status `Failed`, `my_reports_error` set |
//! | `comments[report_id]` | [`load_comments`](FeedController::load_comments), [`post_comment`](FeedController::post_comment) | entry left as is |
//! | `votes[report_id]` | [`load_votes`](FeedController::load_votes), [`post_vote`](FeedController::post_vote) | entry left as is |
//!
//! Comment and vote maps are only ever updated one key at a time inside a single
//! `send_modify`, so loads for different reports can complete in any order
//! without losing each other's entries.
//!
//! Posting never appends the inserted row locally. After a successful insert the
//! whole list for that report is fetched again, so ids and timestamps always
//! come from the server.

use std::collections::HashMap;
use std::sync::Arc;

use api::IdentityWatch;
use store::models::*;
use store::{Backend, Repository, RepositoryError};
use tokio::sync::watch;

/// Progress of one collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Everything the feed screens render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedState {
    pub reports: Vec<Report>,
    pub reports_status: LoadStatus,
    pub my_reports: Vec<Report>,
    pub my_reports_status: LoadStatus,
    pub comments: HashMap<String, Vec<Comment>>,
    pub votes: HashMap<String, Vec<Vote>>,
    /// Why the last `reports` refresh failed, cleared by the next success.
    pub reports_error: Option<String>,
    /// Why the last `my_reports` load failed, cleared by the next success.
    pub my_reports_error: Option<String>,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        self.reports_status == LoadStatus::Loading
    }

    pub fn report(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn comments_for(&self, report_id: &str) -> &[Comment] {
        self.comments.get(report_id).map_or(&[], Vec::as_slice)
    }

    pub fn votes_for(&self, report_id: &str) -> &[Vote] {
        self.votes.get(report_id).map_or(&[], Vec::as_slice)
    }

    pub fn tally(&self, report_id: &str) -> VoteTally {
        VoteTally::from_votes(self.votes_for(report_id))
    }
}

/// Owns and refreshes the feed.
pub struct FeedController<B: Backend> {
    repo: Arc<Repository<B>>,
    identity: IdentityWatch,
    state: watch::Sender<FeedState>,
}

impl<B: Backend> FeedController<B> {
    pub fn new(repo: Arc<Repository<B>>, identity: IdentityWatch) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            repo,
            identity,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Reload the whole feed. Failures leave an empty feed, never an error.
    pub async fn refresh_reports(&self) {
        self.state.send_modify(|s| s.reports_status = LoadStatus::Loading);

        match self.repo.fetch_reports().await {
            Ok(reports) => self.state.send_modify(|s| {
                s.reports = reports;
                s.reports_status = LoadStatus::Loaded;
                s.reports_error = None;
            }),
            Err(e) => {
                tracing::error!("refresh_reports failed: {}", e);
                self.state.send_modify(|s| {
                    s.reports.clear();
                    s.reports_status = LoadStatus::Failed;
                    s.reports_error = Some(e.to_string());
                });
            }
        }
    }

    /// Reload the signed-in user's reports. Does nothing when signed out.
    pub async fn load_my_reports(&self) {
        let Some(uid) = self.identity.borrow().as_ref().map(|i| i.uid.clone()) else {
            return;
        };
        self.state.send_modify(|s| s.my_reports_status = LoadStatus::Loading);

        match self.repo.fetch_reports_by_user(&uid).await {
            Ok(reports) => self.state.send_modify(|s| {
                s.my_reports = reports;
                s.my_reports_status = LoadStatus::Loaded;
                s.my_reports_error = None;
            }),
            Err(e) => {
                tracing::error!("load_my_reports failed: {}", e);
                self.state.send_modify(|s| {
                    s.my_reports.clear();
                    s.my_reports_status = LoadStatus::Failed;
                    s.my_reports_error = Some(e.to_string());
                });
            }
        }
    }

    pub async fn load_comments(&self, report_id: &str) {
        match self.repo.fetch_comments(report_id).await {
            Ok(comments) => self.upsert_comments(report_id, comments),
            Err(e) => tracing::error!(report_id, "load_comments failed: {}", e),
        }
    }

    pub async fn load_votes(&self, report_id: &str) {
        match self.repo.fetch_votes(report_id).await {
            Ok(votes) => self.upsert_votes(report_id, votes),
            Err(e) => tracing::error!(report_id, "load_votes failed: {}", e),
        }
    }

    /// Post a comment, then reload that report's comments.
    ///
    /// Returns `false` and leaves state untouched if the text is blank or any
    /// request fails.
    pub async fn post_comment(&self, report_id: &str, user_id: &str, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let result: Result<Vec<Comment>, RepositoryError> = async {
            self.repo.insert_comment(report_id, user_id, text).await?;
            self.repo.fetch_comments(report_id).await
        }
        .await;

        match result {
            Ok(comments) => {
                self.upsert_comments(report_id, comments);
                true
            }
            Err(e) => {
                tracing::error!(report_id, "post_comment failed: {}", e);
                false
            }
        }
    }

    /// Record a vote, then reload that report's votes. Repeat votes are allowed.
    pub async fn post_vote(&self, report_id: &str, user_id: &str, vote_type: VoteType) -> bool {
        let result: Result<Vec<Vote>, RepositoryError> = async {
            self.repo.insert_vote(report_id, user_id, vote_type).await?;
            self.repo.fetch_votes(report_id).await
        }
        .await;

        match result {
            Ok(votes) => {
                self.upsert_votes(report_id, votes);
                true
            }
            Err(e) => {
                tracing::error!(report_id, "post_vote failed: {}", e);
                false
            }
        }
    }

    fn upsert_comments(&self, report_id: &str, comments: Vec<Comment>) {
        self.state.send_modify(|s| {
            s.comments.insert(report_id.to_string(), comments);
        });
    }

    fn upsert_votes(&self, report_id: &str, votes: Vec<Vote>) {
        self.state.send_modify(|s| {
            s.votes.insert(report_id.to_string(), votes);
        });
    }
}
