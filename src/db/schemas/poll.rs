//! Poll ("sticker") vote schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for poll votes
pub const POLL_COLLECTION: &str = "project_polls";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PollDoc {
    pub id: String,

    pub project_id: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub guest_id: Option<String>,

    /// Raw vote label as submitted; see [`Sticker::from_vote_type`]
    #[serde(default)]
    pub vote_type: String,
}

impl PollDoc {
    pub fn new(id: &str, project_id: &str, vote_type: &str) -> Self {
        Self {
            id: id.to_string(),
            project_id: project_id.to_string(),
            vote_type: vote_type.to_string(),
            ..Default::default()
        }
    }

    pub fn sticker(&self) -> Option<Sticker> {
        Sticker::from_vote_type(&self.vote_type)
    }
}

/// Reviewer sentiment categories, in report tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sticker {
    LaunchNow,
    DevelopMore,
    NeedsResearch,
}

impl Sticker {
    pub const ALL: [Sticker; 3] = [Sticker::LaunchNow, Sticker::DevelopMore, Sticker::NeedsResearch];

    /// Map a stored vote label to its category. Older clients wrote the
    /// short labels (`launch`, `more`, `research`).
    pub fn from_vote_type(vote_type: &str) -> Option<Self> {
        match vote_type.trim() {
            "launch_now" | "launch" => Some(Self::LaunchNow),
            "develop_more" | "more" => Some(Self::DevelopMore),
            "needs_research" | "research" => Some(Self::NeedsResearch),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LaunchNow => "Launch now",
            Self::DevelopMore => "Develop more",
            Self::NeedsResearch => "Needs research",
        }
    }
}

impl IntoIndexes for PollDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "project_id": 1 },
            Some(IndexOptions::builder().name("poll_project_index".to_string()).build()),
        )]
    }
}
