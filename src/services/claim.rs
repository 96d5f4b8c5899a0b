//! Guest identity claim
//!
//! When a guest signs in, everything they submitted under their guest id is
//! moved to their account:
//!
//! - each guest rating is reassigned to the user, unless the user already
//!   rated that project, in which case the guest rating is deleted (the
//!   account's rating wins, scores are never merged)
//! - every guest comment is reassigned unconditionally; several comments per
//!   project from one identity are allowed
//!
//! Rows are processed one at a time with no surrounding transaction. A row
//! that fails is logged and skipped, so an interrupted claim leaves a partial
//! result. Running the claim again finishes the job: already-claimed rows no
//! longer carry the guest id and are not visited.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::FeedbackStore;
use crate::types::Result;

/// What one claim run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClaimOutcome {
    /// Guest ratings moved to the user
    pub reassigned: usize,
    /// Guest ratings deleted because the user already rated the project
    pub discarded: usize,
    /// Guest ratings left untouched after a store error
    pub failed: usize,
    /// Guest comments moved to the user
    pub comments: u64,
}

impl ClaimOutcome {
    /// Guest ratings successfully folded into the account
    pub fn merged_count(&self) -> usize {
        self.reassigned + self.discarded
    }
}

enum RowResult {
    Reassigned,
    Discarded,
}

async fn claim_rating(
    store: &dyn FeedbackStore,
    rating_id: &str,
    project_id: &str,
    user_id: &str,
) -> Result<RowResult> {
    match store.user_rating_for_project(project_id, user_id).await? {
        Some(_) => {
            store.delete_rating(rating_id).await?;
            Ok(RowResult::Discarded)
        }
        None => {
            store.reassign_rating(rating_id, user_id).await?;
            Ok(RowResult::Reassigned)
        }
    }
}

/// Move all of `guest_id`'s ratings and comments to `user_id`
///
/// Fails only if the guest ratings cannot be listed. Per-row errors are
/// counted in [`ClaimOutcome::failed`]; a failed comment reassignment is
/// logged and reported as zero comments.
pub async fn claim_guest_records(
    store: &dyn FeedbackStore,
    user_id: &str,
    guest_id: &str,
) -> Result<ClaimOutcome> {
    let guest_ratings = store.guest_ratings(guest_id).await?;
    debug!(guest_id, count = guest_ratings.len(), "Guest ratings to claim");

    let mut outcome = ClaimOutcome::default();

    for rating in &guest_ratings {
        match claim_rating(store, &rating.id, &rating.project_id, user_id).await {
            Ok(RowResult::Reassigned) => outcome.reassigned += 1,
            Ok(RowResult::Discarded) => {
                debug!(rating_id = %rating.id, project_id = %rating.project_id, "Guest rating superseded by account rating");
                outcome.discarded += 1;
            }
            Err(e) => {
                warn!(rating_id = %rating.id, error = %e, "Failed to claim guest rating, continuing");
                outcome.failed += 1;
            }
        }
    }

    outcome.comments = match store.reassign_guest_comments(guest_id, user_id).await {
        Ok(n) => n,
        Err(e) => {
            warn!(guest_id, error = %e, "Failed to claim guest comments");
            0
        }
    };

    info!(
        user_id,
        guest_id,
        reassigned = outcome.reassigned,
        discarded = outcome.discarded,
        failed = outcome.failed,
        comments = outcome.comments,
        "Guest claim finished"
    );

    Ok(outcome)
}
