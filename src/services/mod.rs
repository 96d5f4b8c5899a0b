//! Business logic behind the HTTP routes
//!
//! Each service takes the store (or an HTTP client) explicitly so it can be
//! driven from routes, the admin CLI and tests alike.

pub mod claim;
pub mod preview;
pub mod profile;
pub mod project_config;
pub mod report;

pub use claim::{claim_guest_records, ClaimOutcome};
pub use preview::{LinkPreview, PreviewClient};
pub use profile::{sanitize_profile, save_profile};
pub use project_config::{merge_config, update_project_config};
pub use report::{build_feedback_report, FeedbackStats};
