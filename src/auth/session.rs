//! Request credential extraction
//!
//! Two ways a request proves who it is:
//! - `Authorization: Bearer <token>` (API clients, the claim endpoint)
//! - the session cookie set by the auth callback (browser requests)

use hyper::header::{AUTHORIZATION, COOKIE};
use hyper::HeaderMap;

use crate::auth::JwtValidator;
use crate::types::ApiError;

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

/// Find a cookie value by name across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    extract_token_from_header(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
}

/// Authenticate a request by bearer credential only
pub fn bearer_user(jwt: &JwtValidator, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;

    jwt.verify_token(token).into_user_id()
}

/// Authenticate a browser request: session cookie first, bearer as fallback
pub fn session_user(
    jwt: &JwtValidator,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<String, ApiError> {
    let token = cookie_value(headers, cookie_name)
        .or_else(|| bearer_token(headers))
        .ok_or_else(|| ApiError::Unauthorized("Not signed in".into()))?;

    jwt.verify_token(token).into_user_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn validator() -> JwtValidator {
        JwtValidator::new("session-test-secret".into(), "authenticated".into()).unwrap()
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sess=tok123; other=1"));

        assert_eq!(cookie_value(&headers, "sess"), Some("tok123"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_bearer_user() {
        let jwt = validator();
        let token = jwt.generate_token("user-1", None, 60).unwrap();

        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_user(&jwt, &headers), Err(ApiError::Unauthorized(_))));

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(bearer_user(&jwt, &headers).unwrap(), "user-1");
    }

    #[test]
    fn test_session_user_prefers_cookie() {
        let jwt = validator();
        let cookie_token = jwt.generate_token("cookie-user", None, 60).unwrap();
        let bearer = jwt.generate_token("bearer-user", None, 60).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("sess={}", cookie_token)).unwrap(),
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer)).unwrap(),
        );

        assert_eq!(session_user(&jwt, &headers, "sess").unwrap(), "cookie-user");
        assert_eq!(session_user(&jwt, &headers, "nope").unwrap(), "bearer-user");
    }

    #[test]
    fn test_session_user_rejects_garbage() {
        let jwt = validator();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sess=not-a-jwt"));

        assert!(session_user(&jwt, &headers, "sess").is_err());
    }
}
