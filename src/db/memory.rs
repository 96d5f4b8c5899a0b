//! In-memory feedback store
//!
//! Used by tests and by dev mode when MongoDB is unreachable. Counts every
//! write that actually changes a row so callers can assert "nothing was
//! mutated".

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::db::schemas::{CommentDoc, PollDoc, ProfileDoc, ProfileUpdate, ProjectDoc, RatingDoc};
use crate::db::store::FeedbackStore;
use crate::types::{ApiError, Result};

#[derive(Default)]
struct Tables {
    projects: Vec<ProjectDoc>,
    ratings: Vec<RatingDoc>,
    polls: Vec<PollDoc>,
    comments: Vec<CommentDoc>,
    profiles: Vec<ProfileDoc>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    mutations: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of row-changing writes performed through [`FeedbackStore`]
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn record_mutations(&self, n: usize) {
        self.mutations.fetch_add(n, Ordering::SeqCst);
    }

    pub async fn insert_project(&self, project: ProjectDoc) {
        self.tables.write().await.projects.push(project);
    }

    pub async fn insert_rating(&self, rating: RatingDoc) {
        self.tables.write().await.ratings.push(rating);
    }

    pub async fn insert_poll(&self, poll: PollDoc) {
        self.tables.write().await.polls.push(poll);
    }

    pub async fn insert_comment(&self, comment: CommentDoc) {
        self.tables.write().await.comments.push(comment);
    }

    pub async fn insert_profile(&self, profile: ProfileDoc) {
        self.tables.write().await.profiles.push(profile);
    }

    pub async fn rating(&self, rating_id: &str) -> Option<RatingDoc> {
        self.tables
            .read()
            .await
            .ratings
            .iter()
            .find(|r| r.id == rating_id)
            .cloned()
    }

    pub async fn comment(&self, comment_id: &str) -> Option<CommentDoc> {
        self.tables
            .read()
            .await
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl FeedbackStore for InMemoryStore {
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned())
    }

    async fn set_project_config(&self, project_id: &str, config: &Value) -> Result<()> {
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| ApiError::NotFound(format!("Project {}", project_id)))?;

        project.custom_config = config.clone();
        self.record_mutations(1);
        Ok(())
    }

    async fn ratings_for_project(&self, project_id: &str) -> Result<Vec<RatingDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .ratings
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn polls_for_project(&self, project_id: &str) -> Result<Vec<PollDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .polls
            .iter()
            .filter(|p| p.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn comments_for_project(&self, project_id: &str) -> Result<Vec<CommentDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<ProfileDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned())
    }

    async fn profiles_by_ids(&self, user_ids: &[String]) -> Result<Vec<ProfileDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .profiles
            .iter()
            .filter(|p| user_ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn upsert_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.profiles.iter().position(|p| p.id == user_id) {
            Some(idx) => {
                let existing = tables.profiles[idx].clone();
                tables.profiles[idx] = update.apply_to(user_id, Some(existing));
            }
            None => tables.profiles.push(update.apply_to(user_id, None)),
        }
        self.record_mutations(1);
        Ok(())
    }

    async fn guest_ratings(&self, guest_id: &str) -> Result<Vec<RatingDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .ratings
            .iter()
            .filter(|r| r.guest_id.as_deref() == Some(guest_id))
            .cloned()
            .collect())
    }

    async fn user_rating_for_project(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<RatingDoc>> {
        Ok(self
            .tables
            .read()
            .await
            .ratings
            .iter()
            .find(|r| r.project_id == project_id && r.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn delete_rating(&self, rating_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.ratings.len();
        tables.ratings.retain(|r| r.id != rating_id);
        self.record_mutations(before - tables.ratings.len());
        Ok(())
    }

    async fn reassign_rating(&self, rating_id: &str, user_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(rating) = tables.ratings.iter_mut().find(|r| r.id == rating_id) {
            rating.user_id = Some(user_id.to_string());
            rating.guest_id = None;
            self.record_mutations(1);
        }
        Ok(())
    }

    async fn reassign_guest_comments(&self, guest_id: &str, user_id: &str) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for comment in tables
            .comments
            .iter_mut()
            .filter(|c| c.guest_id.as_deref() == Some(guest_id))
        {
            comment.user_id = Some(user_id.to_string());
            comment.guest_id = None;
            changed += 1;
        }
        self.record_mutations(changed);
        Ok(changed as u64)
    }
}
