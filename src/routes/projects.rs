//! Project configuration endpoint

use bytes::Bytes;
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::auth::bearer_user;
use crate::routes::response::{error_response, json_response, BoxBody};
use crate::server::AppState;
use crate::services::update_project_config;
use crate::types::{ApiError, Result};

#[derive(Serialize)]
struct ConfigResponse {
    success: bool,
    custom_config: Value,
}

async fn patch_config(
    state: &AppState,
    headers: &HeaderMap,
    project_id: &str,
    body: &Bytes,
) -> Result<Value> {
    let user_id = bearer_user(&state.jwt, headers)?;
    let patch: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    update_project_config(state.store.as_ref(), &user_id, project_id, &patch).await
}

/// `PATCH /api/projects/{id}/custom-config`
pub async fn handle_custom_config(
    state: &AppState,
    headers: &HeaderMap,
    project_id: &str,
    body: &Bytes,
) -> Response<BoxBody> {
    match patch_config(state, headers, project_id, body).await {
        Ok(custom_config) => json_response(
            StatusCode::OK,
            &ConfigResponse {
                success: true,
                custom_config,
            },
        ),
        Err(e) => error_response(&e),
    }
}
