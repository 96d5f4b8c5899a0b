//! Feedback report aggregation
//!
//! One full pass over a project's ratings, polls and comments. Nothing is
//! cached or paginated; the report is rebuilt on every request, which is
//! fine at the expected volume of a few hundred rows per project.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::db::schemas::{CommentDoc, PollDoc, ProfileDoc, RatingDoc, Sticker, SCORE_FIELDS};
use crate::db::FeedbackStore;
use crate::types::Result;

/// Number of score buckets (scores 5 down to 1)
pub const SCORE_BUCKETS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StickerCount {
    #[serde(rename = "type")]
    pub kind: Sticker,
    pub label: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub michelin_avg: f64,
    pub category_avgs: [f64; SCORE_FIELDS],
    pub total_ratings: u64,
    /// Index 0 holds score 5, index 4 holds score 1
    pub score_distribution: [u64; SCORE_BUCKETS],
    pub top_stickers: Vec<StickerCount>,
    pub secret_proposals: u64,
    pub total_comments: u64,
    pub expertise_distribution: BTreeMap<String, u64>,
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        round1(sum / count as f64)
    }
}

/// Bucket index for a primary score: 5 → 0, 1 → 4. Out-of-range scores are
/// clamped so every rating lands in exactly one bucket.
pub fn score_bucket(score: f64) -> usize {
    let rounded = if score.is_finite() { score.round() } else { 1.0 };
    let clamped = rounded.clamp(1.0, SCORE_BUCKETS as f64) as usize;
    SCORE_BUCKETS - clamped
}

/// Aggregate already-loaded rows into report statistics
pub fn aggregate(
    ratings: &[RatingDoc],
    polls: &[PollDoc],
    comments: &[CommentDoc],
    profiles: &[ProfileDoc],
) -> FeedbackStats {
    let mut sums = [0.0_f64; SCORE_FIELDS];
    let mut counts = [0_u64; SCORE_FIELDS];
    let mut score_distribution = [0_u64; SCORE_BUCKETS];
    let mut expertise_distribution = BTreeMap::new();

    for rating in ratings {
        for (i, value) in rating.scores().iter().enumerate() {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                sums[i] += v;
                counts[i] += 1;
            }
        }

        score_distribution[score_bucket(rating.score)] += 1;

        let profile = rating
            .user_id
            .as_deref()
            .and_then(|uid| profiles.iter().find(|p| p.id == uid));
        if let Some(profile) = profile {
            let labels: HashSet<&str> = profile
                .expertise
                .fields
                .iter()
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .collect();
            for label in labels {
                *expertise_distribution.entry(label.to_string()).or_insert(0) += 1;
            }
        }
    }

    let category_avgs: [f64; SCORE_FIELDS] = std::array::from_fn(|i| mean(sums[i], counts[i]));

    let mut top_stickers: Vec<StickerCount> = Sticker::ALL
        .iter()
        .map(|&kind| StickerCount {
            kind,
            label: kind.label(),
            count: polls.iter().filter(|p| p.sticker() == Some(kind)).count() as u64,
        })
        .collect();
    // Stable sort keeps declaration order among ties
    top_stickers.sort_by(|a, b| b.count.cmp(&a.count));

    FeedbackStats {
        michelin_avg: category_avgs[0],
        category_avgs,
        total_ratings: ratings.len() as u64,
        score_distribution,
        top_stickers,
        secret_proposals: comments.iter().filter(|c| c.is_secret).count() as u64,
        total_comments: comments.len() as u64,
        expertise_distribution,
    }
}

/// Load every feedback row for `project_id` and aggregate it.
///
/// Any read failure aborts the whole report.
pub async fn build_feedback_report(
    store: &dyn FeedbackStore,
    project_id: &str,
) -> Result<FeedbackStats> {
    let ratings = store.ratings_for_project(project_id).await?;
    let polls = store.polls_for_project(project_id).await?;
    let comments = store.comments_for_project(project_id).await?;

    let mut author_ids: Vec<String> = ratings.iter().filter_map(|r| r.user_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();
    let profiles = store.profiles_by_ids(&author_ids).await?;

    Ok(aggregate(&ratings, &polls, &comments, &profiles))
}
