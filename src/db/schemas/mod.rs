//! Database schemas
//!
//! Document structures for projects, ratings, polls, comments and profiles.

mod comment;
mod poll;
mod profile;
mod project;
mod rating;

pub use comment::{CommentDoc, COMMENT_COLLECTION};
pub use poll::{PollDoc, Sticker, POLL_COLLECTION};
pub use profile::{Expertise, ProfileDoc, ProfileUpdate, PROFILE_COLLECTION};
pub use project::{ProjectDoc, PROJECT_COLLECTION};
pub use rating::{RatingDoc, RATING_COLLECTION, SCORE_FIELDS};
