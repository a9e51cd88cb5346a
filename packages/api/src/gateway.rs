//! # Gateway: HTTP access to the hosted backend
//!
//! [`Gateway`] implements [`store::Backend`] against a PostgREST-style REST API
//! and an object storage endpoint. It is the only code in the workspace that
//! builds URLs or touches `reqwest`.
//!
//! ## Requests
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list_reports` | `GET /rest/v1/reports?select=*&order=created_at.desc[&user_id=eq.<uid>]` |
//! | `list_comments` | `GET /rest/v1/comments?report_id=eq.<id>` |
//! | `list_votes` | `GET /rest/v1/votes?report_id=eq.<id>` |
//! | `insert_*` | `POST /rest/v1/<resource>` with `Prefer: return=representation` and a JSON body |
//! | `upload_object` | `PUT /storage/v1/object/<bucket>/<file>` with the raw bytes |
//!
//! Every request carries `apikey: <key>` and `Authorization: Bearer <key>`.
//!
//! ## Responses
//!
//! REST responses are decoded straight into typed rows by [`decode_rows`]. A
//! non-2xx status becomes [`GatewayError::Http`] with the response body; a 2xx
//! with an empty body is an empty list. A successful upload returns the
//! object's public URL, derived from the storage public-URL template rather
//! than read from the response.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::models::*;
use store::{Backend, BackendConfig, GatewayError};

const REPORTS: &str = "reports";
const COMMENTS: &str = "comments";
const VOTES: &str = "votes";

/// Typed client for the REST and storage endpoints.
#[derive(Clone, Debug)]
pub struct Gateway {
    http: Client,
    config: BackendConfig,
}

impl Gateway {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Use an existing `reqwest` client (shared connection pool, custom timeouts).
    pub fn with_client(http: Client, config: BackendConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    fn list_reports_request(&self, filter: &ReportFilter) -> RequestBuilder {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(uid) = &filter.user_id {
            query.push(("user_id", eq(uid)));
        }
        self.request(Method::GET, self.config.rest_url(REPORTS))
            .query(&query)
    }

    fn list_for_report_request(&self, resource: &str, report_id: &str) -> RequestBuilder {
        self.request(Method::GET, self.config.rest_url(resource))
            .query(&[("report_id", eq(report_id))])
    }

    fn insert_request<T: Serialize>(&self, resource: &str, payload: &T) -> RequestBuilder {
        self.request(Method::POST, self.config.rest_url(resource))
            .header("Prefer", "return=representation")
            .json(payload)
    }

    fn upload_request(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> RequestBuilder {
        self.request(Method::PUT, self.config.object_url(path))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        resource: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>, GatewayError> {
        let response = request.send().await.map_err(network)?;
        let status = response.status();
        let body = response.text().await.map_err(network)?;
        let rows = decode_rows(status, &body);
        if let Err(e) = &rows {
            tracing::warn!(resource, "request failed: {}", e);
        }
        rows
    }
}

/// PostgREST equality filter value.
fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn network(e: reqwest::Error) -> GatewayError {
    GatewayError::Network(e.to_string())
}

/// Decode a REST response body into rows.
pub fn decode_rows<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Vec<T>, GatewayError> {
    if !status.is_success() {
        return Err(GatewayError::Http {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Map a storage upload response status to success or [`GatewayError::Upload`].
pub fn check_upload(status: StatusCode, body: String) -> Result<(), GatewayError> {
    if status.is_success() {
        return Ok(());
    }
    Err(GatewayError::Upload {
        status: status.as_u16(),
        body,
    })
}

impl Backend for Gateway {
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, GatewayError> {
        tracing::debug!(user_id = ?filter.user_id, "listing reports");
        self.fetch_rows(REPORTS, self.list_reports_request(filter))
            .await
    }

    async fn list_comments(&self, report_id: &str) -> Result<Vec<Comment>, GatewayError> {
        self.fetch_rows(COMMENTS, self.list_for_report_request(COMMENTS, report_id))
            .await
    }

    async fn list_votes(&self, report_id: &str) -> Result<Vec<Vote>, GatewayError> {
        self.fetch_rows(VOTES, self.list_for_report_request(VOTES, report_id))
            .await
    }

    async fn insert_report(&self, payload: &ReportInsert) -> Result<Vec<Report>, GatewayError> {
        self.fetch_rows(REPORTS, self.insert_request(REPORTS, payload))
            .await
    }

    async fn insert_comment(&self, payload: &CommentInsert) -> Result<Vec<Comment>, GatewayError> {
        self.fetch_rows(COMMENTS, self.insert_request(COMMENTS, payload))
            .await
    }

    async fn insert_vote(&self, payload: &VoteInsert) -> Result<Vec<Vote>, GatewayError> {
        self.fetch_rows(VOTES, self.insert_request(VOTES, payload))
            .await
    }

    async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let response = self
            .upload_request(path, bytes, content_type)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let body = if status.is_success() {
            String::new()
        } else {
            response.text().await.unwrap_or_default()
        };
        if let Err(e) = check_upload(status, body) {
            tracing::warn!(%path, "upload rejected: {}", e);
            return Err(e);
        }
        Ok(self.config.public_object_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> Gateway {
        Gateway::new(BackendConfig::new("https://x.supabase.co/", "anon-key"))
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> &'a str {
        request.headers()[name].to_str().unwrap()
    }

    #[test]
    fn test_list_reports_url() {
        let request = gateway()
            .list_reports_request(&ReportFilter::all())
            .build()
            .unwrap();
        assert_eq!(*request.method(), Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://x.supabase.co/rest/v1/reports?select=*&order=created_at.desc"
        );
    }

    #[test]
    fn test_list_reports_by_user_url() {
        let request = gateway()
            .list_reports_request(&ReportFilter::by_user("u1"))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://x.supabase.co/rest/v1/reports?select=*&order=created_at.desc&user_id=eq.u1"
        );
    }

    #[test]
    fn test_list_for_report_url() {
        let gateway = gateway();
        let comments = gateway
            .list_for_report_request(COMMENTS, "r1")
            .build()
            .unwrap();
        assert_eq!(
            comments.url().as_str(),
            "https://x.supabase.co/rest/v1/comments?report_id=eq.r1"
        );
        let votes = gateway.list_for_report_request(VOTES, "r1").build().unwrap();
        assert_eq!(
            votes.url().as_str(),
            "https://x.supabase.co/rest/v1/votes?report_id=eq.r1"
        );
    }

    #[test]
    fn test_every_request_is_authenticated() {
        let gateway = gateway();
        let requests = [
            gateway.list_reports_request(&ReportFilter::all()),
            gateway.list_for_report_request(VOTES, "r1"),
            gateway.upload_request("reports/a.png", vec![1, 2], "image/png"),
        ];
        for request in requests {
            let request = request.build().unwrap();
            assert_eq!(header(&request, "apikey"), "anon-key");
            assert_eq!(header(&request, "authorization"), "Bearer anon-key");
        }
    }

    #[test]
    fn test_insert_requests_representation() {
        let payload = VoteInsert {
            report_id: "r1".to_string(),
            user_id: "u1".to_string(),
            vote_type: VoteType::Upvote,
        };
        let request = gateway()
            .insert_request(VOTES, &payload)
            .build()
            .unwrap();

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url().as_str(), "https://x.supabase.co/rest/v1/votes");
        assert_eq!(header(&request, "prefer"), "return=representation");
        assert_eq!(header(&request, "content-type"), "application/json");

        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"report_id": "r1", "user_id": "u1", "vote_type": "upvote"})
        );
    }

    #[test]
    fn test_upload_request() {
        let request = gateway()
            .upload_request("reports/report_1_a.png", b"data".to_vec(), "image/png")
            .build()
            .unwrap();
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(
            request.url().as_str(),
            "https://x.supabase.co/storage/v1/object/reports/report_1_a.png"
        );
        assert_eq!(header(&request, "content-type"), "image/png");
        assert_eq!(request.body().unwrap().as_bytes().unwrap(), b"data");
    }

    #[test]
    fn test_decode_inserted_row() {
        let body = r#"[{"id":"r1","user_id":"u1","category":"Theft","description":"x","created_at":"2025-01-01T00:00:00Z"}]"#;
        let rows: Vec<Report> = decode_rows(StatusCode::CREATED, body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "r1");
        assert_eq!(rows[0].user_id.as_deref(), Some("u1"));
        assert!(!rows[0].verified);
    }

    #[test]
    fn test_decode_failure_status() {
        let err = decode_rows::<Report>(StatusCode::FORBIDDEN, "policy violation").unwrap_err();
        match err {
            GatewayError::Http { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "policy violation");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_empty_body_is_empty_list() {
        let rows: Vec<Comment> = decode_rows(StatusCode::OK, "").unwrap();
        assert!(rows.is_empty());
        let rows: Vec<Comment> = decode_rows(StatusCode::OK, "[]").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_upload_forbidden_is_upload_error() {
        let body = r#"{"statusCode":"403","error":"Unauthorized","message":"new row violates row-level security policy"}"#;
        let err = check_upload(StatusCode::FORBIDDEN, body.to_string()).unwrap_err();
        match err {
            GatewayError::Upload { status, body: returned } => {
                assert_eq!(status, 403);
                assert_eq!(returned, body);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_upload(StatusCode::OK, String::new()).is_ok());
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_rows::<Vote>(StatusCode::OK, "{\"oops\":1}").unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
