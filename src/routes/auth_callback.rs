//! Authentication callback
//!
//! The identity provider sends the browser to
//! `/auth/callback?code=...&next=/path&type=...` at the end of a sign-in,
//! magic-link or password-recovery flow. The code is exchanged for a session
//! which is stored in HttpOnly cookies, then the browser is redirected:
//! - `type=recovery` → `/reset-password`
//! - otherwise → `next` (same-site paths only, default `/`)
//! - any failure → `/login?error=auth_callback_failed`

use hyper::{HeaderMap, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{cookie_value, Session};
use crate::config::Args;
use crate::routes::response::{redirect_response, BoxBody};
use crate::server::AppState;
use crate::types::{ApiError, Result};

/// Refresh tokens outlive the access token; the provider rotates them
const REFRESH_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 30;

pub const LOGIN_FAILURE_PATH: &str = "/login?error=auth_callback_failed";
pub const RECOVERY_PATH: &str = "/reset-password";

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    next: Option<String>,
    #[serde(rename = "type")]
    flow: Option<String>,
}

/// Keep `next` only when it is a path on this site.
///
/// Rejects absolute URLs, protocol-relative `//host` and backslash tricks
/// that browsers normalise into `//host`.
pub fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn cookie(args: &Args, name: &str, value: &str, max_age: u64) -> String {
    let secure = if args.site_url.starts_with("https://") {
        "; Secure"
    } else {
        ""
    };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, max_age, secure
    )
}

fn session_cookies(args: &Args, session: &Session) -> Vec<String> {
    let mut cookies = vec![cookie(
        args,
        &args.session_cookie,
        &session.access_token,
        session.expires_in,
    )];
    if !session.refresh_token.is_empty() {
        cookies.push(cookie(
            args,
            &args.refresh_cookie(),
            &session.refresh_token,
            REFRESH_COOKIE_MAX_AGE,
        ));
    }
    // The verifier is single-use
    cookies.push(cookie(args, &args.code_verifier_cookie(), "", 0));
    cookies
}

async fn exchange(state: &AppState, headers: &HeaderMap, query: &CallbackQuery) -> Result<Session> {
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".into()))?;

    let verifier = cookie_value(headers, &state.args.code_verifier_cookie())
        .ok_or_else(|| ApiError::BadRequest("Missing code verifier".into()))?;

    state.auth.exchange_code(code, verifier).await
}

pub async fn handle_auth_callback(
    state: &AppState,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Response<BoxBody> {
    let site = state.args.site_origin();
    let query: CallbackQuery = serde_urlencoded::from_str(query.unwrap_or("")).unwrap_or_default();

    match exchange(state, headers, &query).await {
        Ok(session) => {
            let path = if query.flow.as_deref() == Some("recovery") {
                RECOVERY_PATH
            } else {
                sanitize_next(query.next.as_deref())
            };
            info!(path, "Auth callback succeeded");
            redirect_response(
                &format!("{}{}", site, path),
                &session_cookies(&state.args, &session),
            )
        }
        Err(e) => {
            warn!(error = %e, "Auth callback failed");
            redirect_response(&format!("{}{}", site, LOGIN_FAILURE_PATH), &[])
        }
    }
}
