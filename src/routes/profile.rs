//! Profile endpoints
//!
//! Both require a signed-in session. The profile is keyed by the session's
//! user id; the body never chooses whose profile is written.

use bytes::Bytes;
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::auth::session_user;
use crate::db::schemas::ProfileDoc;
use crate::routes::response::{error_response, json_response, BoxBody};
use crate::server::AppState;
use crate::services::save_profile;
use crate::types::{ApiError, Result};

#[derive(Serialize)]
struct SaveResponse {
    success: bool,
}

#[derive(Serialize)]
struct ProfileResponse {
    success: bool,
    profile: Option<ProfileDoc>,
}

fn current_user(state: &AppState, headers: &HeaderMap) -> Result<String> {
    session_user(&state.jwt, headers, &state.args.session_cookie)
}

async fn save(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<()> {
    let user_id = current_user(state, headers)?;
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    save_profile(state.store.as_ref(), &user_id, &payload).await?;
    Ok(())
}

async fn load(state: &AppState, headers: &HeaderMap) -> Result<Option<ProfileDoc>> {
    let user_id = current_user(state, headers)?;
    state.store.get_profile(&user_id).await
}

/// `POST /api/user/profile`
pub async fn handle_save_profile(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Response<BoxBody> {
    match save(state, headers, body).await {
        Ok(()) => json_response(StatusCode::OK, &SaveResponse { success: true }),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/user/profile`
pub async fn handle_get_profile(state: &AppState, headers: &HeaderMap) -> Response<BoxBody> {
    match load(state, headers).await {
        Ok(profile) => json_response(
            StatusCode::OK,
            &ProfileResponse {
                success: true,
                profile,
            },
        ),
        Err(e) => error_response(&e),
    }
}
