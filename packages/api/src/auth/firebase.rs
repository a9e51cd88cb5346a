//! # Firebase ID token exchange
//!
//! Exchanges a Google ID token (obtained by the platform's native sign-in UI)
//! for a Firebase user through the Identity Toolkit REST API:
//!
//! 1. `POST <endpoint>/v1/accounts:signInWithIdp?key=<api key>` with a body of
//!    `postBody = "id_token=<token>&providerId=google.com"`.
//! 2. On success the response carries `localId` (the Firebase uid) and an
//!    optional `displayName`; these become the current [`Identity`].
//! 3. On failure the response is `{"error": {"message": "..."}}`; the message is
//!    surfaced as [`AuthError::Rejected`].
//!
//! Signing out only forgets the identity locally; Firebase has no server-side
//! session to revoke for this flow.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use store::Identity;

use super::{AuthError, FirebaseConfig, IdentityCell, IdentityProvider, IdentityWatch};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest {
    post_body: String,
    request_uri: String,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firebase-backed identity provider.
pub struct FirebaseAuth {
    http: Client,
    config: FirebaseConfig,
    identity: IdentityCell,
}

impl FirebaseAuth {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            identity: IdentityCell::new(None),
        }
    }

    fn sign_in_request(&self, id_token: &str) -> RequestBuilder {
        let body = SignInRequest {
            post_body: format!("id_token={id_token}&providerId=google.com"),
            request_uri: self.config.request_uri.clone(),
            return_idp_credential: true,
            return_secure_token: true,
        };
        self.http
            .post(self.config.sign_in_url())
            .query(&[("key", &self.config.api_key)])
            .json(&body)
    }
}

/// Interpret an Identity Toolkit sign-in response.
fn parse_sign_in(status: StatusCode, body: &str) -> Result<Identity, AuthError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("{} - {}", status.as_u16(), body));
        return Err(AuthError::Rejected(message));
    }
    let response: SignInResponse =
        serde_json::from_str(body).map_err(|e| AuthError::Rejected(e.to_string()))?;
    Ok(Identity {
        uid: response.local_id,
        display_name: response.display_name,
    })
}

impl IdentityProvider for FirebaseAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.current()
    }

    fn subscribe(&self) -> IdentityWatch {
        self.identity.subscribe()
    }

    async fn exchange_token(&self, id_token: &str) -> Result<Identity, AuthError> {
        let response = self
            .sign_in_request(id_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let identity = parse_sign_in(status, &body)?;
        tracing::info!(uid = %identity.uid, "signed in");
        self.identity.set(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) {
        self.identity.set(None);
    }
}
