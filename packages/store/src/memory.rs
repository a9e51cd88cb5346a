use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::config::BackendConfig;
use crate::error::GatewayError;
use crate::models::*;
use crate::repo::Backend;

#[derive(Debug, Default)]
struct Tables {
    reports: Vec<Report>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    objects: HashMap<String, (Vec<u8>, String)>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

/// In-memory Backend for testing and offline demos.
///
/// Assigns ids and `created_at` on insert the way the hosted backend does and
/// lists newest first. [`set_offline`](Self::set_offline) and
/// [`reject_inserts`](Self::reject_inserts) simulate a dropped connection and a
/// row-level policy that silently discards inserts.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    config: BackendConfig,
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
    reject_inserts: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(BackendConfig::new("memory://backend", ""))
    }
}

impl MemoryBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            tables: Arc::default(),
            offline: Arc::default(),
            reject_inserts: Arc::default(),
            requests: Arc::default(),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Fail every request with a network error while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Accept inserts but return no rows while set.
    pub fn reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    /// Number of requests received, including failed ones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stored object bytes and content type at `path`.
    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.tables.lock().unwrap().objects.get(path).cloned()
    }

    fn begin(&self) -> Result<(), GatewayError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("backend unreachable".to_string()));
        }
        Ok(())
    }

    fn rejecting(&self) -> bool {
        self.reject_inserts.load(Ordering::SeqCst)
    }
}

fn newest_first<T>(rows: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    rows.rev().collect()
}

impl Backend for MemoryBackend {
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, GatewayError> {
        self.begin()?;
        let tables = self.tables.lock().unwrap();
        Ok(newest_first(tables.reports.iter().filter(|r| {
            filter
                .user_id
                .as_ref()
                .map_or(true, |uid| r.user_id.as_ref() == Some(uid))
        }).cloned()))
    }

    async fn list_comments(&self, report_id: &str) -> Result<Vec<Comment>, GatewayError> {
        self.begin()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn list_votes(&self, report_id: &str) -> Result<Vec<Vote>, GatewayError> {
        self.begin()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .votes
            .iter()
            .filter(|v| v.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn insert_report(&self, payload: &ReportInsert) -> Result<Vec<Report>, GatewayError> {
        self.begin()?;
        if self.rejecting() {
            return Ok(Vec::new());
        }
        let mut tables = self.tables.lock().unwrap();
        let report = Report {
            id: tables.next_id("r"),
            user_id: Some(payload.user_id.clone()),
            category: payload.category.clone(),
            description: payload.description.clone(),
            location: payload.location.clone(),
            media_url: payload.media_url.clone(),
            verified: false,
            created_at: Some(Utc::now().to_rfc3339()),
        };
        tables.reports.push(report.clone());
        Ok(vec![report])
    }

    async fn insert_comment(&self, payload: &CommentInsert) -> Result<Vec<Comment>, GatewayError> {
        self.begin()?;
        if self.rejecting() {
            return Ok(Vec::new());
        }
        let mut tables = self.tables.lock().unwrap();
        let comment = Comment {
            id: tables.next_id("c"),
            report_id: payload.report_id.clone(),
            user_id: payload.user_id.clone(),
            comment: payload.comment.clone(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        tables.comments.push(comment.clone());
        Ok(vec![comment])
    }

    async fn insert_vote(&self, payload: &VoteInsert) -> Result<Vec<Vote>, GatewayError> {
        self.begin()?;
        if self.rejecting() {
            return Ok(Vec::new());
        }
        let mut tables = self.tables.lock().unwrap();
        let vote = Vote {
            id: tables.next_id("v"),
            report_id: payload.report_id.clone(),
            user_id: payload.user_id.clone(),
            vote_type: payload.vote_type,
            created_at: Some(Utc::now().to_rfc3339()),
        };
        tables.votes.push(vote.clone());
        Ok(vec![vote])
    }

    async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        self.begin()?;
        self.tables
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(self.config.public_object_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::repo::Repository;

    fn draft(uid: &str, category: &str) -> ReportInsert {
        ReportInsert {
            user_id: uid.to_string(),
            category: Some(category.to_string()),
            description: Some("something happened".to_string()),
            location: Some(DEFAULT_LOCATION.to_string()),
            media_url: None,
            verified: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_reports() {
        let repo = Repository::new(MemoryBackend::default(), "reports");

        // Initially empty
        assert!(repo.fetch_reports().await.unwrap().is_empty());

        let first = repo.insert_report(&draft("u1", "Theft")).await.unwrap();
        let second = repo.insert_report(&draft("u2", "Accident")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.created_at.is_some());

        // Newest first
        let reports = repo.fetch_reports().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, second.id);
        assert_eq!(reports[1].id, first.id);
    }

    #[tokio::test]
    async fn test_reports_by_user() {
        let repo = Repository::new(MemoryBackend::default(), "reports");

        repo.insert_report(&draft("u1", "Theft")).await.unwrap();
        repo.insert_report(&draft("u2", "Accident")).await.unwrap();
        repo.insert_report(&draft("u1", "Other")).await.unwrap();

        let mine = repo.fetch_reports_by_user("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.user_id.as_deref() == Some("u1")));
        assert!(repo.fetch_reports_by_user("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comments_and_votes_scoped_to_report() {
        let repo = Repository::new(MemoryBackend::default(), "reports");

        repo.insert_comment("r1", "u1", "seen it too").await.unwrap();
        repo.insert_comment("r2", "u1", "elsewhere").await.unwrap();
        repo.insert_vote("r1", "u1", VoteType::Upvote).await.unwrap();
        repo.insert_vote("r1", "u1", VoteType::Upvote).await.unwrap();
        repo.insert_vote("r1", "u2", VoteType::Fake).await.unwrap();

        let comments = repo.fetch_comments("r1").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment, "seen it too");

        let tally = VoteTally::from_votes(&repo.fetch_votes("r1").await.unwrap());
        assert_eq!(tally, VoteTally { upvotes: 2, fake: 1 });
    }

    #[tokio::test]
    async fn test_rejected_insert_is_empty_result() {
        let backend = MemoryBackend::default();
        backend.reject_inserts(true);
        let repo = Repository::new(backend, "reports");

        let err = repo.insert_report(&draft("u1", "Theft")).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::InsertFailed(GatewayError::EmptyInsertResult)
        ));
        assert!(repo.fetch_reports().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_is_network_failure() {
        let backend = MemoryBackend::default();
        backend.set_offline(true);
        let repo = Repository::new(backend.clone(), "reports");

        let err = repo.fetch_reports().await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::FetchFailed(GatewayError::Network(_))
        ));
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let backend = MemoryBackend::new(BackendConfig::new("https://x.supabase.co", "key"));
        let repo = Repository::new(backend.clone(), "reports");

        let url = repo
            .upload_media(&b"\x89PNG"[..], "report_1_a.png", "image/png")
            .await
            .unwrap();
        assert_eq!(
            url,
            "https://x.supabase.co/storage/v1/object/public/reports/report_1_a.png"
        );
        let (bytes, content_type) = backend.object("reports/report_1_a.png").unwrap();
        assert_eq!(bytes, b"\x89PNG");
        assert_eq!(content_type, "image/png");
    }
}
