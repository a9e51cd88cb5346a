//! Error taxonomy for backend access.
//!
//! [`GatewayError`] is what a [`crate::Backend`] reports; [`RepositoryError`] is
//! what [`crate::Repository`] hands to controllers after re-wrapping it.

use thiserror::Error;

/// Failure talking to the REST or storage endpoints.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("network failure: {0}")]
    Network(String),
    /// Non-2xx response from a REST resource.
    #[error("request failed: {status} - {body}")]
    Http { status: u16, body: String },
    /// 2xx insert that returned no rows, usually a row-level policy rejection.
    #[error("insert returned no rows")]
    EmptyInsertResult,
    /// Non-2xx response from the storage endpoint.
    #[error("upload failed: {status} - {body}")]
    Upload { status: u16, body: String },
    /// 2xx response whose body did not match the expected rows.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Failure of a repository operation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] GatewayError),
    #[error("insert failed: {0}")]
    InsertFailed(#[source] GatewayError),
    #[error("{0}")]
    UploadFailed(#[source] GatewayError),
    #[error("cannot read media: {0}")]
    UnreadableMedia(#[from] std::io::Error),
}

impl RepositoryError {
    /// The underlying gateway failure, if any.
    pub fn gateway(&self) -> Option<&GatewayError> {
        match self {
            RepositoryError::FetchFailed(e)
            | RepositoryError::InsertFailed(e)
            | RepositoryError::UploadFailed(e) => Some(e),
            RepositoryError::UnreadableMedia(_) => None,
        }
    }
}

/// Failure loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
