//! Bearer-token verification against the auth provider.
//!
//! When a request carries a token, the verified identity always overrides
//! any client-supplied `user_id`; an unverifiable token rejects the request
//! outright. Requests without a token may fall back to the client-supplied
//! id when the relay is configured to allow it (see
//! [`RelayConfig::allow_anonymous`](crate::config::RelayConfig)).

use axum::http::{header, HeaderMap};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token rejected by auth provider")]
    InvalidToken,

    #[error("Auth provider returned status {0}")]
    Provider(u16),

    #[error("Auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Identity confirmed by the auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Verifies bearer tokens by asking the auth provider who they belong to.
pub struct AuthVerifier {
    http: reqwest::Client,
    auth_url: String,
    api_key: Option<String>,
}

impl AuthVerifier {
    pub fn new(auth_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url,
            api_key,
        }
    }

    /// Resolve a bearer token to the identity it belongs to.
    pub async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let url = format!("{}/user", self.auth_url.trim_end_matches('/'));

        let mut request = self.http.get(&url).bearer_auth(token);
        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(status.as_u16()));
        }

        let user: VerifiedUser = response.json().await?;
        Ok(user)
    }
}

/// Extract a non-empty bearer token from the `Authorization` header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
