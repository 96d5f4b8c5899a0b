//! Link preview endpoint
//!
//! `GET /api/og-preview?url=<page>`. Only a bad `url` parameter is an error;
//! upstream trouble still answers 200 with empty fields.

use hyper::{Response, StatusCode};
use serde::Deserialize;

use crate::routes::response::{error_response, json_response, BoxBody};
use crate::server::AppState;
use crate::services::preview::validate_target;
use crate::types::{ApiError, Result};

#[derive(Debug, Default, Deserialize)]
struct PreviewQuery {
    url: Option<String>,
}

fn target_from_query(query: Option<&str>) -> Result<String> {
    let query: PreviewQuery = serde_urlencoded::from_str(query.unwrap_or(""))
        .map_err(|e| ApiError::BadRequest(format!("Invalid query: {}", e)))?;

    let url = query
        .url
        .ok_or_else(|| ApiError::BadRequest("url parameter is required".into()))?;
    Ok(validate_target(&url)?.to_string())
}

pub async fn handle_og_preview(state: &AppState, query: Option<&str>) -> Response<BoxBody> {
    match target_from_query(query) {
        Ok(target) => {
            let preview = state.preview.fetch(&target).await;
            json_response(StatusCode::OK, &preview)
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_query() {
        assert_eq!(
            target_from_query(Some("url=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1")).unwrap(),
            "https://example.com/a?b=1"
        );
        assert!(target_from_query(None).is_err());
        assert!(target_from_query(Some("other=1")).is_err());
        assert!(target_from_query(Some("url=file%3A%2F%2F%2Fetc%2Fpasswd")).is_err());
    }
}
