//! Feedback report endpoint
//!
//! `GET /api/projects/{id}/feedback-report` is public: it returns aggregated
//! numbers only, never individual rows. A project with no feedback, or an id
//! that does not exist, yields an all-zero report.

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;
use crate::services::{build_feedback_report, FeedbackStats};

#[derive(Debug, Serialize)]
struct ReportResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<FeedbackStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn handle_feedback_report(state: &AppState, project_id: &str) -> Response<BoxBody> {
    match build_feedback_report(state.store.as_ref(), project_id).await {
        Ok(stats) => json_response(
            StatusCode::OK,
            &ReportResponse {
                success: true,
                stats: Some(stats),
                error: None,
            },
        ),
        Err(e) => {
            error!(project_id, error = %e, "Feedback report failed");
            json_response(
                e.status_code(),
                &ReportResponse {
                    success: false,
                    stats: None,
                    error: Some(e.message().to_string()),
                },
            )
        }
    }
}
