//! Configuration for the MyRatingIs API
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Insecure secret used only when running with `DEV_MODE=true`
const DEV_JWT_SECRET: &str = "dev-only-insecure-secret-not-for-production";

/// MyRatingIs API - project ratings, polls and feedback reports
#[derive(Parser, Debug, Clone)]
#[command(name = "myratingis-api")]
#[command(about = "Rating, poll and feedback-report backend for MyRatingIs")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (insecure JWT secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "myratingis")]
    pub mongodb_db: String,

    /// Secret the identity provider signs access tokens with (HS256)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Expected `aud` claim on access tokens
    #[arg(long, env = "JWT_AUDIENCE", default_value = "authenticated")]
    pub jwt_audience: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Base URL of the identity provider's auth API (code exchange)
    /// (e.g., "https://project.supabase.co/auth/v1")
    #[arg(long, env = "AUTH_URL")]
    pub auth_url: Option<String>,

    /// Public API key sent to the identity provider
    #[arg(long, env = "AUTH_API_KEY")]
    pub auth_api_key: Option<String>,

    /// Public site origin that auth redirects point at
    #[arg(long, env = "SITE_URL", default_value = "http://localhost:3000")]
    pub site_url: String,

    /// Name of the cookie holding the session access token.
    /// The refresh token and PKCE verifier cookies use it as a prefix.
    #[arg(long, env = "SESSION_COOKIE", default_value = "mri-access-token")]
    pub session_cookie: String,

    /// Link-preview metadata service
    #[arg(long, env = "OG_SERVICE_URL", default_value = "https://api.microlink.io")]
    pub og_service_url: String,

    /// Timeout for link-preview lookups in milliseconds
    #[arg(long, env = "OG_TIMEOUT_MS", default_value = "5000")]
    pub og_timeout_ms: u64,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Some(secret.clone()),
            (None, true) => Some(DEV_JWT_SECRET.to_string()),
            (None, false) => None,
        }
    }

    pub fn og_timeout(&self) -> Duration {
        Duration::from_millis(self.og_timeout_ms)
    }

    /// Cookie carrying the refresh token
    pub fn refresh_cookie(&self) -> String {
        format!("{}-refresh", self.session_cookie)
    }

    /// Cookie carrying the PKCE code verifier set by the frontend
    pub fn code_verifier_cookie(&self) -> String {
        format!("{}-code-verifier", self.session_cookie)
    }

    /// Site origin without a trailing slash
    pub fn site_origin(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.og_timeout_ms == 0 {
            return Err("OG_TIMEOUT_MS must be greater than zero".to_string());
        }

        if !self.site_url.starts_with("http://") && !self.site_url.starts_with("https://") {
            return Err("SITE_URL must be an http(s) origin".to_string());
        }

        Ok(())
    }
}
