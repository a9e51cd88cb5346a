//! Firebase configuration from environment variables.

use store::ConfigError;

const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";

/// Identity Toolkit settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FirebaseConfig {
    /// Web API key of the Firebase project.
    pub api_key: String,
    /// Identity Toolkit base URL. Overridable for emulators.
    pub endpoint: String,
    /// Redirect URI reported to the provider; unused for ID token sign-in but required.
    pub request_uri: String,
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_uri: "http://localhost".to_string(),
        }
    }

    /// Create config from `FIREBASE_API_KEY` and the optional `FIREBASE_AUTH_ENDPOINT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("FIREBASE_API_KEY")
            .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?;
        let mut config = Self::new(api_key);
        if let Ok(endpoint) = std::env::var("FIREBASE_AUTH_ENDPOINT") {
            config.endpoint = endpoint;
        }
        Ok(config)
    }

    pub fn sign_in_url(&self) -> String {
        format!(
            "{}/v1/accounts:signInWithIdp",
            self.endpoint.trim_end_matches('/')
        )
    }
}
