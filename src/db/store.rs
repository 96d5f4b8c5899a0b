//! Feedback store abstraction
//!
//! Every handler talks to storage through [`FeedbackStore`]. Production runs
//! on [`MongoStore`]; tests and dev mode without a database run on
//! [`crate::db::InMemoryStore`]. All operations are single-document or
//! single-filter; nothing here spans a transaction.

use bson::doc;
use serde_json::Value;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    CommentDoc, PollDoc, ProfileDoc, ProfileUpdate, ProjectDoc, RatingDoc, COMMENT_COLLECTION,
    POLL_COLLECTION, PROFILE_COLLECTION, PROJECT_COLLECTION, RATING_COLLECTION,
};
use crate::types::{ApiError, Result};

#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    // Projects

    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectDoc>>;

    /// Replace a project's custom configuration
    async fn set_project_config(&self, project_id: &str, config: &Value) -> Result<()>;

    // Feedback reads

    async fn ratings_for_project(&self, project_id: &str) -> Result<Vec<RatingDoc>>;

    async fn polls_for_project(&self, project_id: &str) -> Result<Vec<PollDoc>>;

    async fn comments_for_project(&self, project_id: &str) -> Result<Vec<CommentDoc>>;

    // Profiles

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileDoc>>;

    async fn profiles_by_ids(&self, user_ids: &[String]) -> Result<Vec<ProfileDoc>>;

    /// Write exactly the fields in `update`, creating the profile if needed
    async fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()>;

    // Guest claim

    async fn guest_ratings(&self, guest_id: &str) -> Result<Vec<RatingDoc>>;

    async fn user_rating_for_project(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<RatingDoc>>;

    async fn delete_rating(&self, rating_id: &str) -> Result<()>;

    /// Set `user_id` and clear `guest_id` on one rating
    async fn reassign_rating(&self, rating_id: &str, user_id: &str) -> Result<()>;

    /// Move every comment of `guest_id` to `user_id`; returns rows changed
    async fn reassign_guest_comments(&self, guest_id: &str, user_id: &str) -> Result<u64>;
}

/// MongoDB-backed store
pub struct MongoStore {
    projects: MongoCollection<ProjectDoc>,
    ratings: MongoCollection<RatingDoc>,
    polls: MongoCollection<PollDoc>,
    comments: MongoCollection<CommentDoc>,
    profiles: MongoCollection<ProfileDoc>,
}

impl MongoStore {
    /// Open all collections and ensure their indexes exist
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            projects: mongo.collection(PROJECT_COLLECTION).await?,
            ratings: mongo.collection(RATING_COLLECTION).await?,
            polls: mongo.collection(POLL_COLLECTION).await?,
            comments: mongo.collection(COMMENT_COLLECTION).await?,
            profiles: mongo.collection(PROFILE_COLLECTION).await?,
        })
    }

    pub async fn insert_project(&self, project: &ProjectDoc) -> Result<()> {
        self.projects.insert_one(project).await
    }
}

#[async_trait::async_trait]
impl FeedbackStore for MongoStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectDoc>> {
        self.projects.find_one(doc! { "id": project_id }).await
    }

    async fn set_project_config(&self, project_id: &str, config: &Value) -> Result<()> {
        let config = bson::to_bson(config)?;
        let result = self
            .projects
            .update_one(doc! { "id": project_id }, doc! { "$set": { "custom_config": config } })
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::NotFound(format!("Project {}", project_id)));
        }
        Ok(())
    }

    async fn ratings_for_project(&self, project_id: &str) -> Result<Vec<RatingDoc>> {
        self.ratings.find_many(doc! { "project_id": project_id }).await
    }

    async fn polls_for_project(&self, project_id: &str) -> Result<Vec<PollDoc>> {
        self.polls.find_many(doc! { "project_id": project_id }).await
    }

    async fn comments_for_project(&self, project_id: &str) -> Result<Vec<CommentDoc>> {
        self.comments.find_many(doc! { "project_id": project_id }).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileDoc>> {
        self.profiles.find_one(doc! { "id": user_id }).await
    }

    async fn profiles_by_ids(&self, user_ids: &[String]) -> Result<Vec<ProfileDoc>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.profiles
            .find_many(doc! { "id": { "$in": user_ids.to_vec() } })
            .await
    }

    async fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let fields = bson::to_document(update)?;
        self.profiles
            .upsert_one(
                doc! { "id": user_id },
                doc! {
                    "$set": fields,
                    "$setOnInsert": { "username": "" },
                },
            )
            .await?;
        Ok(())
    }

    async fn guest_ratings(&self, guest_id: &str) -> Result<Vec<RatingDoc>> {
        self.ratings.find_many(doc! { "guest_id": guest_id }).await
    }

    async fn user_rating_for_project(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<RatingDoc>> {
        self.ratings
            .find_one(doc! { "project_id": project_id, "user_id": user_id })
            .await
    }

    async fn delete_rating(&self, rating_id: &str) -> Result<()> {
        self.ratings.delete_one(doc! { "id": rating_id }).await?;
        Ok(())
    }

    async fn reassign_rating(&self, rating_id: &str, user_id: &str) -> Result<()> {
        self.ratings
            .update_one(
                doc! { "id": rating_id },
                doc! { "$set": { "user_id": user_id, "guest_id": bson::Bson::Null } },
            )
            .await?;
        Ok(())
    }

    async fn reassign_guest_comments(&self, guest_id: &str, user_id: &str) -> Result<u64> {
        let result = self
            .comments
            .update_many(
                doc! { "guest_id": guest_id },
                doc! { "$set": { "user_id": user_id, "guest_id": bson::Bson::Null } },
            )
            .await?;
        Ok(result.modified_count)
    }
}
