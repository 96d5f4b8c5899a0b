//! Project document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::mongo::IntoIndexes;

/// Collection name for projects
pub const PROJECT_COLLECTION: &str = "projects";

/// A submitted project that collects ratings, polls and comments
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProjectDoc {
    pub id: String,

    /// Owner (authenticated user id)
    pub user_id: String,

    #[serde(default)]
    pub title: String,

    /// "public", "unlisted" or "private"
    #[serde(default = "default_visibility")]
    pub visibility: String,

    /// Loosely typed evaluation setup: audit type, categories, poll options,
    /// questions. Merged in place on update.
    #[serde(default = "empty_object")]
    pub custom_config: Value,
}

fn default_visibility() -> String {
    "public".to_string()
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl ProjectDoc {
    pub fn new(id: impl Into<String>, owner: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: owner.into(),
            title: title.into(),
            visibility: default_visibility(),
            custom_config: empty_object(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

impl IntoIndexes for ProjectDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("project_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(IndexOptions::builder().name("project_owner_index".to_string()).build()),
            ),
        ]
    }
}
