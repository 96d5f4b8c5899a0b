//! Rating document schema
//!
//! A rating is owned by exactly one of `user_id` (signed in) or `guest_id`
//! (pre-login). One rating per (project, identity) is kept by the claim
//! flow, not by an index: guest and user rows for the same project coexist
//! until the guest signs in.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for ratings
pub const RATING_COLLECTION: &str = "project_ratings";

/// Number of score fields on a rating (`score`, `score_1` .. `score_4`)
pub const SCORE_FIELDS: usize = 5;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RatingDoc {
    pub id: String,

    pub project_id: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub guest_id: Option<String>,

    /// Primary ("michelin") score, 1..5
    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub score_1: Option<f64>,
    #[serde(default)]
    pub score_2: Option<f64>,
    #[serde(default)]
    pub score_3: Option<f64>,
    #[serde(default)]
    pub score_4: Option<f64>,
}

impl RatingDoc {
    pub fn by_user(id: &str, project_id: &str, user_id: &str, score: f64) -> Self {
        Self {
            id: id.to_string(),
            project_id: project_id.to_string(),
            user_id: Some(user_id.to_string()),
            score,
            ..Default::default()
        }
    }

    pub fn by_guest(id: &str, project_id: &str, guest_id: &str, score: f64) -> Self {
        Self {
            id: id.to_string(),
            project_id: project_id.to_string(),
            guest_id: Some(guest_id.to_string()),
            score,
            ..Default::default()
        }
    }

    /// All five score fields in report order
    pub fn scores(&self) -> [Option<f64>; SCORE_FIELDS] {
        [
            Some(self.score),
            self.score_1,
            self.score_2,
            self.score_3,
            self.score_4,
        ]
    }
}

impl IntoIndexes for RatingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("rating_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "project_id": 1, "user_id": 1 },
                Some(IndexOptions::builder().name("rating_project_user".to_string()).build()),
            ),
            (
                doc! { "guest_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("rating_guest_index".to_string())
                        .sparse(true)
                        .build(),
                ),
            ),
        ]
    }
}
