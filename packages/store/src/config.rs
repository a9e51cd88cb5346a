//! # Backend configuration: `incidents.toml`
//!
//! Describes where the hosted backend lives and which storage bucket receives
//! report media. The same values can come from a TOML file
//! (filename: [`BackendConfig::filename`] = `"incidents.toml"`) or from the
//! environment (see `api::config`).
//!
//! ## Structure
//!
//! ```toml
//! url = "https://project.supabase.co"
//! anon_key = "..."
//! bucket = "reports"      # optional, defaults to "reports"
//! ```
//!
//! ## URL helpers
//!
//! | Method | Produces |
//! |--------|----------|
//! | [`rest_url`](BackendConfig::rest_url) | `<url>/rest/v1/<resource>` |
//! | [`object_url`](BackendConfig::object_url) | `<url>/storage/v1/object/<path>` |
//! | [`public_object_url`](BackendConfig::public_object_url) | `<url>/storage/v1/object/public/<path>` |
//!
//! A trailing slash on `url` is ignored, so `"https://x.co/"` and `"https://x.co"`
//! produce identical URLs.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Connection settings for the REST and storage endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend project.
    pub url: String,
    /// Public (anon) key sent as both `apikey` and bearer token.
    #[serde(default)]
    pub anon_key: String,
    /// Storage bucket for report media.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    "reports".to_string()
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            bucket: default_bucket(),
        }
    }

    /// Builder method to set the media bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "incidents.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn rest_url(&self, resource: &str) -> String {
        format!("{}/rest/v1/{}", self.base(), resource)
    }

    pub fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}", self.base(), path)
    }

    pub fn public_object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}", self.base(), path)
    }
}
