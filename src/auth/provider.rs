//! Identity provider client
//!
//! The browser finishes an OAuth / magic-link / recovery flow by landing on
//! `/auth/callback?code=...`. The code plus the PKCE verifier (left in a
//! cookie by the frontend) is exchanged here for a session.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ApiError;

/// Session returned by a successful code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Trait for exchanging an authorization code (allows mocking in tests)
#[async_trait::async_trait]
pub trait CodeExchanger: Send + Sync {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, ApiError>;
}

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

/// Code exchange against the provider's `/token?grant_type=pkce` endpoint
pub struct HttpCodeExchanger {
    http: reqwest::Client,
    auth_url: String,
    api_key: Option<String>,
}

impl HttpCodeExchanger {
    pub fn new(http: reqwest::Client, auth_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl CodeExchanger for HttpCodeExchanger {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<Session, ApiError> {
        let url = format!("{}/token?grant_type=pkce", self.auth_url);
        debug!("Exchanging auth code at {}", url);

        let mut request = self.http.post(&url).json(&PkceGrant {
            auth_code: code,
            code_verifier,
        });
        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "Code exchange rejected with status {}",
                response.status()
            )));
        }

        let session: Session = response.json().await?;
        if session.access_token.is_empty() {
            return Err(ApiError::Upstream("Code exchange returned no access token".into()));
        }

        Ok(session)
    }
}

/// Exchanger used when no identity provider is configured
pub struct DisabledCodeExchanger;

#[async_trait::async_trait]
impl CodeExchanger for DisabledCodeExchanger {
    async fn exchange_code(&self, _code: &str, _code_verifier: &str) -> Result<Session, ApiError> {
        Err(ApiError::Config("AUTH_URL is not configured".into()))
    }
}
