//! # Report submission
//!
//! [`SubmissionController`] holds the draft being composed on the "new report"
//! screen and drives the two network steps: uploading the picked media and
//! inserting the report row.
//!
//! ## Flags
//!
//! `uploading` and `submitting` are set with `send_if_modified`, so a second
//! call while one is in flight sees the flag already raised and backs off
//! without touching the network. Both are lowered by a [`FlagGuard`] when the
//! call returns, whatever path it returns by.
//!
//! ## Validation
//!
//! [`submit_report`](SubmissionController::submit_report) checks, in order:
//!
//! | Check | Message |
//! |-------|---------|
//! | category chosen | `Please choose a category` |
//! | description not blank | `Please add a description` |
//! | no upload in flight | `Image is still uploading, please wait` |
//! | signed in | `User not signed in` |
//!
//! The first failing check becomes the [`SubmitResult::Error`] and no request is
//! made.

use std::sync::Arc;

use api::IdentityWatch;
use chrono::Utc;
use store::models::{ext_from_mime, ReportInsert, DEFAULT_LOCATION};
use store::{Backend, Repository};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use uuid::Uuid;

/// Content type sent when the picker gives no MIME type.
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// The report being composed.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    pub selected_category: Option<String>,
    pub description: String,
    pub location_text: String,
    /// Public URL of the uploaded media, once the upload has finished.
    pub picked_media_url: Option<String>,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            selected_category: None,
            description: String::new(),
            location_text: DEFAULT_LOCATION.to_string(),
            picked_media_url: None,
        }
    }
}

/// Outcome shown after an upload or submit attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitResult {
    Success,
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionState {
    pub draft: Draft,
    pub uploading: bool,
    pub submitting: bool,
    pub result: Option<SubmitResult>,
}

/// Why a draft cannot be submitted yet.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Invalid {
    #[error("Please choose a category")]
    MissingCategory,
    #[error("Please add a description")]
    BlankDescription,
    #[error("Image is still uploading, please wait")]
    StillUploading,
    #[error("User not signed in")]
    NotSignedIn,
}

/// Lowers one boolean flag of the state when dropped.
struct FlagGuard<'a> {
    state: &'a watch::Sender<SubmissionState>,
    flag: fn(&mut SubmissionState) -> &mut bool,
}

impl<'a> FlagGuard<'a> {
    /// Raise the flag, or return `None` if it is already raised.
    fn acquire(
        state: &'a watch::Sender<SubmissionState>,
        flag: fn(&mut SubmissionState) -> &mut bool,
    ) -> Option<Self> {
        let raised = state.send_if_modified(|s| {
            let f = flag(s);
            if *f {
                return false;
            }
            *f = true;
            true
        });
        raised.then(|| Self { state, flag })
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        let flag = self.flag;
        self.state.send_modify(|s| *flag(s) = false);
    }
}

fn uploading(s: &mut SubmissionState) -> &mut bool {
    &mut s.uploading
}

fn submitting(s: &mut SubmissionState) -> &mut bool {
    &mut s.submitting
}

/// Unique object name for an upload: `report_<millis>_<uuid>.<ext>`.
pub fn media_file_name(mime_hint: Option<&str>) -> String {
    format!(
        "report_{}_{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        ext_from_mime(mime_hint)
    )
}

/// Composes and submits new reports.
pub struct SubmissionController<B: Backend> {
    repo: Arc<Repository<B>>,
    identity: IdentityWatch,
    state: watch::Sender<SubmissionState>,
}

impl<B: Backend> SubmissionController<B> {
    pub fn new(repo: Arc<Repository<B>>, identity: IdentityWatch) -> Self {
        let (state, _) = watch::channel(SubmissionState::default());
        Self {
            repo,
            identity,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn select_category(&self, category: impl Into<String>) {
        let category = category.into();
        self.state
            .send_modify(|s| s.draft.selected_category = Some(category));
    }

    pub fn set_description(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.draft.description = text);
    }

    pub fn set_location(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|s| s.draft.location_text = text);
    }

    /// Forget the uploaded media. The stored object is left in place.
    pub fn clear_media(&self) {
        self.state.send_modify(|s| s.draft.picked_media_url = None);
    }

    pub fn reset_result(&self) {
        self.state.send_modify(|s| s.result = None);
    }

    /// Upload picked media and attach its public URL to the draft.
    ///
    /// Returns `None` without doing anything if another upload is running. On
    /// failure the error is reported through `result` and the draft keeps
    /// whatever media it had before.
    pub async fn upload_media_only<R>(&self, reader: R, mime_hint: Option<&str>) -> Option<String>
    where
        R: AsyncRead + Unpin,
    {
        let Some(_guard) = FlagGuard::acquire(&self.state, uploading) else {
            tracing::warn!("upload already in progress");
            return None;
        };
        self.state.send_modify(|s| s.result = None);

        let file_name = media_file_name(mime_hint);
        let content_type = mime_hint.unwrap_or(DEFAULT_CONTENT_TYPE);
        match self
            .repo
            .upload_media(reader, &file_name, content_type)
            .await
        {
            Ok(url) => {
                tracing::info!(%url, "media uploaded");
                self.state
                    .send_modify(|s| s.draft.picked_media_url = Some(url.clone()));
                Some(url)
            }
            Err(e) => {
                tracing::error!("media upload failed: {}", e);
                self.state.send_modify(|s| {
                    s.result = Some(SubmitResult::Error(format!("Media upload error: {e}")))
                });
                None
            }
        }
    }

    /// Validate the draft and insert it as a new report.
    ///
    /// On success the draft is reset to its defaults and `result` becomes
    /// [`SubmitResult::Success`].
    pub async fn submit_report(&self) -> bool {
        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(invalid) => {
                self.state
                    .send_modify(|s| s.result = Some(SubmitResult::Error(invalid.to_string())));
                return false;
            }
        };
        let Some(_guard) = FlagGuard::acquire(&self.state, submitting) else {
            tracing::warn!("submit already in progress");
            return false;
        };
        self.state.send_modify(|s| s.result = None);

        match self.repo.insert_report(&payload).await {
            Ok(report) => {
                tracing::info!(id = %report.id, "report submitted");
                self.state.send_modify(|s| {
                    s.result = Some(SubmitResult::Success);
                    s.draft = Draft::default();
                });
                true
            }
            Err(e) => {
                tracing::error!("submit_report failed: {}", e);
                self.state
                    .send_modify(|s| s.result = Some(SubmitResult::Error(e.to_string())));
                false
            }
        }
    }

    /// Build the insert payload, or the first reason the draft is not ready.
    pub fn validate(&self) -> Result<ReportInsert, Invalid> {
        let state = self.state.borrow();
        let draft = &state.draft;

        let category = draft
            .selected_category
            .as_ref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(Invalid::MissingCategory)?;
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(Invalid::BlankDescription);
        }
        if state.uploading {
            return Err(Invalid::StillUploading);
        }
        let user_id = self
            .identity
            .borrow()
            .as_ref()
            .map(|i| i.uid.clone())
            .ok_or(Invalid::NotSignedIn)?;

        Ok(ReportInsert {
            user_id,
            category: Some(category.clone()),
            description: Some(description.to_string()),
            location: Some(draft.location_text.clone()),
            media_url: draft.picked_media_url.clone(),
            verified: false,
        })
    }
}
