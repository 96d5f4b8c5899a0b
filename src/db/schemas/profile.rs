//! Profile document schema
//!
//! Keyed by the authenticated user id. `username` is assigned at sign-up and
//! never written by the profile endpoint.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// Areas of expertise a reviewer declares
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Expertise {
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProfileDoc {
    pub id: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub nickname: String,

    #[serde(default)]
    pub gender: String,

    #[serde(default)]
    pub age_group: String,

    #[serde(default)]
    pub occupation: String,

    #[serde(default)]
    pub expertise: Expertise,

    /// RFC 3339 timestamp of the last profile write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The exact set of fields a profile write may touch
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    pub nickname: String,
    pub gender: String,
    pub age_group: String,
    pub occupation: String,
    pub expertise: Expertise,
    pub updated_at: String,
}

impl ProfileUpdate {
    /// Apply onto an existing (or fresh) profile for `user_id`
    pub fn apply_to(&self, user_id: &str, existing: Option<ProfileDoc>) -> ProfileDoc {
        let base = existing.unwrap_or_else(|| ProfileDoc {
            id: user_id.to_string(),
            ..Default::default()
        });

        ProfileDoc {
            nickname: self.nickname.clone(),
            gender: self.gender.clone(),
            age_group: self.age_group.clone(),
            occupation: self.occupation.clone(),
            expertise: self.expertise.clone(),
            updated_at: Some(self.updated_at.clone()),
            ..base
        }
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("profile_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}
