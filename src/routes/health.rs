//! Health check endpoint
//!
//! `/health` is a liveness probe: 200 whenever the process is serving. The
//! body carries build information for deployment verification.

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    pub build_time: &'static str,
    /// "development" or "production"
    pub mode: &'static str,
    /// Which store backend is serving requests ("mongodb" or "memory")
    pub store: &'static str,
    pub timestamp: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        store: state.store_backend,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}
