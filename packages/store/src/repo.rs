//! # Repository: domain operations over an abstract backend
//!
//! [`Repository`] is the only thing controllers talk to when they need data. It
//! turns "fetch the feed" or "post a comment" into calls on a [`Backend`], narrows
//! the representation rows an insert returns to the single inserted entity, and
//! re-wraps backend failures as [`RepositoryError`].
//!
//! ## [`Backend`] trait
//!
//! An async interface mirroring the hosted service: three list calls, three
//! inserts that return the representation rows the server wrote, and an object
//! upload that returns the public URL of the stored object. Implementations live
//! in [`MemoryBackend`](crate::MemoryBackend) (in-process, for tests and demos) and in the `api` crate
//! (HTTP).
//!
//! ## Operations
//!
//! | Method | Backend call | Failure |
//! |--------|-------------|---------|
//! | [`fetch_reports`](Repository::fetch_reports) | `list_reports(all)` | `FetchFailed` |
//! | [`fetch_reports_by_user`](Repository::fetch_reports_by_user) | `list_reports(user_id = uid)` | `FetchFailed` |
//! | [`fetch_comments`](Repository::fetch_comments) / [`fetch_votes`](Repository::fetch_votes) | `list_*(report_id)` | `FetchFailed` |
//! | [`insert_report`](Repository::insert_report) / [`insert_comment`](Repository::insert_comment) / [`insert_vote`](Repository::insert_vote) | `insert_*` then row 0 | `InsertFailed` |
//! | [`upload_media`](Repository::upload_media) | read stream, `upload_object("<bucket>/<file>")` | `UnreadableMedia` / `UploadFailed` |
//!
//! An empty list is a successful fetch. An insert that comes back with zero rows
//! fails with [`GatewayError::EmptyInsertResult`] wrapped in `InsertFailed`.
//!
//! The repository holds no mutable state; share one instance behind an `Arc`.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{GatewayError, RepositoryError};
use crate::models::*;

/// Async access to the hosted REST and storage endpoints.
pub trait Backend {
    fn list_reports(
        &self,
        filter: &ReportFilter,
    ) -> impl Future<Output = Result<Vec<Report>, GatewayError>>;
    fn list_comments(
        &self,
        report_id: &str,
    ) -> impl Future<Output = Result<Vec<Comment>, GatewayError>>;
    fn list_votes(
        &self,
        report_id: &str,
    ) -> impl Future<Output = Result<Vec<Vote>, GatewayError>>;
    /// Returns the representation rows the backend wrote.
    fn insert_report(
        &self,
        payload: &ReportInsert,
    ) -> impl Future<Output = Result<Vec<Report>, GatewayError>>;
    fn insert_comment(
        &self,
        payload: &CommentInsert,
    ) -> impl Future<Output = Result<Vec<Comment>, GatewayError>>;
    fn insert_vote(
        &self,
        payload: &VoteInsert,
    ) -> impl Future<Output = Result<Vec<Vote>, GatewayError>>;
    /// Store `bytes` at `path` (`<bucket>/<file>`) and return its public URL.
    fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, GatewayError>>;
}

/// Take the inserted row out of a representation response.
pub fn first_row<T>(rows: Vec<T>) -> Result<T, GatewayError> {
    rows.into_iter().next().ok_or(GatewayError::EmptyInsertResult)
}

/// Report, comment and vote operations backed by a [`Backend`].
pub struct Repository<B: Backend> {
    backend: B,
    bucket: String,
}

impl<B: Backend> Repository<B> {
    pub fn new(backend: B, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The whole feed, newest first.
    pub async fn fetch_reports(&self) -> Result<Vec<Report>, RepositoryError> {
        self.backend
            .list_reports(&ReportFilter::all())
            .await
            .map_err(RepositoryError::FetchFailed)
    }

    /// Reports owned by `uid`, newest first.
    pub async fn fetch_reports_by_user(&self, uid: &str) -> Result<Vec<Report>, RepositoryError> {
        self.backend
            .list_reports(&ReportFilter::by_user(uid))
            .await
            .map_err(RepositoryError::FetchFailed)
    }

    pub async fn fetch_comments(&self, report_id: &str) -> Result<Vec<Comment>, RepositoryError> {
        self.backend
            .list_comments(report_id)
            .await
            .map_err(RepositoryError::FetchFailed)
    }

    pub async fn fetch_votes(&self, report_id: &str) -> Result<Vec<Vote>, RepositoryError> {
        self.backend
            .list_votes(report_id)
            .await
            .map_err(RepositoryError::FetchFailed)
    }

    pub async fn insert_report(&self, payload: &ReportInsert) -> Result<Report, RepositoryError> {
        self.backend
            .insert_report(payload)
            .await
            .and_then(first_row)
            .map_err(RepositoryError::InsertFailed)
    }

    pub async fn insert_comment(
        &self,
        report_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<Comment, RepositoryError> {
        let payload = CommentInsert {
            report_id: report_id.to_string(),
            user_id: user_id.to_string(),
            comment: text.to_string(),
        };
        self.backend
            .insert_comment(&payload)
            .await
            .and_then(first_row)
            .map_err(RepositoryError::InsertFailed)
    }

    pub async fn insert_vote(
        &self,
        report_id: &str,
        user_id: &str,
        vote_type: VoteType,
    ) -> Result<Vote, RepositoryError> {
        let payload = VoteInsert {
            report_id: report_id.to_string(),
            user_id: user_id.to_string(),
            vote_type,
        };
        self.backend
            .insert_vote(&payload)
            .await
            .and_then(first_row)
            .map_err(RepositoryError::InsertFailed)
    }

    /// Read `reader` to the end and store it as `<bucket>/<file_name>`.
    ///
    /// `file_name` must already be unique; an existing object at the same path
    /// is not checked for.
    pub async fn upload_media<R>(
        &self,
        mut reader: R,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, RepositoryError>
    where
        R: AsyncRead + Unpin,
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let path = format!("{}/{}", self.bucket, file_name);
        tracing::debug!(%path, len = bytes.len(), "uploading media");
        self.backend
            .upload_object(&path, bytes, content_type)
            .await
            .map_err(RepositoryError::UploadFailed)
    }
}
