//! MyRatingIs API - rating, poll and feedback-report backend
//!
//! Visitors rate projects on a 1-5 scale (plus up to four category scores),
//! vote with poll "stickers" and leave comments, either signed in or under a
//! browser-local guest id. This crate serves the JSON endpoints around that
//! data:
//!
//! - **Claim**: move a guest's ratings and comments onto their new account
//! - **Feedback report**: per-project aggregate statistics
//! - **Profile**: reviewer demographics and expertise
//! - **Project config**: owner-only custom configuration patches
//! - **Link preview**: OG metadata for a submitted project URL
//! - **Auth callback**: identity-provider code exchange into session cookies

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{dispatch, run, AppState};
pub use types::{ApiError, Result};
