//! Comment document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for comments
pub const COMMENT_COLLECTION: &str = "comments";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CommentDoc {
    pub id: String,

    pub project_id: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub guest_id: Option<String>,

    #[serde(default)]
    pub content: String,

    /// Private proposal visible only to the project owner
    #[serde(default)]
    pub is_secret: bool,
}

impl CommentDoc {
    pub fn new(id: &str, project_id: &str, content: &str, is_secret: bool) -> Self {
        Self {
            id: id.to_string(),
            project_id: project_id.to_string(),
            content: content.to_string(),
            is_secret,
            ..Default::default()
        }
    }
}

impl IntoIndexes for CommentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "project_id": 1 },
                Some(IndexOptions::builder().name("comment_project_index".to_string()).build()),
            ),
            (
                doc! { "guest_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("comment_guest_index".to_string())
                        .sparse(true)
                        .build(),
                ),
            ),
        ]
    }
}
