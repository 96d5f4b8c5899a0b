//! Guest-to-account claim endpoint
//!
//! `POST /api/auth/claim-ratings` with `{ "guest_id": "..." }`. The caller
//! must present a bearer token; its subject becomes the new owner of every
//! rating and comment recorded under the guest identifier.

use bytes::Bytes;
use hyper::{HeaderMap, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::bearer_user;
use crate::routes::response::{error_response, json_response, BoxBody};
use crate::server::AppState;
use crate::services::claim_guest_records;
use crate::types::{ApiError, Result};

#[derive(Debug, Deserialize)]
struct ClaimRequest {
    #[serde(default)]
    guest_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClaimResponse {
    success: bool,
    merged_count: usize,
}

fn parse_guest_id(body: &Bytes) -> Result<String> {
    let request: ClaimRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    request
        .guest_id
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .ok_or_else(|| ApiError::BadRequest("guest_id is required".into()))
}

async fn claim(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<ClaimResponse> {
    let user_id = bearer_user(&state.jwt, headers)?;
    let guest_id = parse_guest_id(body)?;

    let outcome = claim_guest_records(state.store.as_ref(), &user_id, &guest_id).await?;

    Ok(ClaimResponse {
        success: true,
        merged_count: outcome.merged_count(),
    })
}

pub async fn handle_claim_ratings(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Response<BoxBody> {
    match claim(state, headers, body).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(&e),
    }
}
