//! HTTP routes for the MyRatingIs API

use std::borrow::Cow;

pub mod auth_callback;
pub mod claim;
pub mod feedback;
pub mod health;
pub mod og_preview;
pub mod profile;
pub mod projects;
pub mod response;

pub use auth_callback::handle_auth_callback;
pub use claim::handle_claim_ratings;
pub use feedback::handle_feedback_report;
pub use health::health_check;
pub use og_preview::handle_og_preview;
pub use profile::{handle_get_profile, handle_save_profile};
pub use projects::handle_custom_config;
pub use response::{cors_preflight, error_response, json_response, BoxBody};

/// Percent-decoded project id from `/api/projects/{id}/{suffix}`
pub fn project_route<'a>(path: &'a str, suffix: &str) -> Option<Cow<'a, str>> {
    let rest = path.strip_prefix("/api/projects/")?;
    let (id, tail) = rest.split_once('/')?;
    if id.is_empty() || tail != suffix {
        return None;
    }
    urlencoding::decode(id).ok().filter(|id| !id.is_empty())
}
