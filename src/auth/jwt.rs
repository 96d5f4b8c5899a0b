//! JWT access-token handling
//!
//! The identity provider issues HS256 access tokens whose `sub` claim is the
//! user id. This module verifies them (and mints them for development and
//! tests, with the same claim layout).
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - The `aud` claim must match the configured audience
//! - In production, JWT_SECRET must be the provider's signing secret

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::ApiError;

/// Payload stored in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Result of token validation
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl TokenValidationResult {
    pub fn valid(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error.into()),
        }
    }

    /// Collapse into the authenticated user id or an `Unauthorized` error
    pub fn into_user_id(self) -> Result<String, ApiError> {
        match self.claims {
            Some(claims) if self.valid && !claims.sub.is_empty() => Ok(claims.sub),
            Some(_) => Err(ApiError::Unauthorized("Token has no subject".into())),
            None => Err(ApiError::Unauthorized(
                self.error.unwrap_or_else(|| "Invalid token".into()),
            )),
        }
    }
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    audience: String,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty
    pub fn new(secret: String, audience: String) -> Result<Self, ApiError> {
        if secret.is_empty() {
            return Err(ApiError::Config("JWT_SECRET must not be empty".into()));
        }

        Ok(Self { secret, audience })
    }

    /// Mint a token for `user_id` valid for `expiry_seconds`
    pub fn generate_token(
        &self,
        user_id: &str,
        email: Option<String>,
        expiry_seconds: u64,
    ) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            email,
            role: Some("authenticated".into()),
            aud: Some(self.audience.clone()),
            iat: now,
            exp: now + expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.as_str()]);

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(token_data) => TokenValidationResult::valid(token_data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let error_msg = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    ErrorKind::InvalidAudience => "Invalid audience",
                    _ => "Token validation failed",
                };
                TokenValidationResult::invalid(error_msg)
            }
        }
    }
}
