//! Project custom configuration
//!
//! The configuration (audit type, rating categories, poll options, extra
//! questions) is schemaless JSON owned by the frontend. Updates are patches:
//! objects merge key by key, every other value replaces what was there.

use serde_json::Value;
use tracing::info;

use crate::db::FeedbackStore;
use crate::types::{ApiError, Result};

/// Merge `patch` into `target` in place
pub fn merge_config(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => merge_config(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Apply `patch` to the configuration of a project owned by `user_id`
pub async fn update_project_config(
    store: &dyn FeedbackStore,
    user_id: &str,
    project_id: &str,
    patch: &Value,
) -> Result<Value> {
    if !patch.is_object() {
        return Err(ApiError::BadRequest("Configuration patch must be a JSON object".into()));
    }

    let project = store
        .get_project(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project {}", project_id)))?;

    if !project.is_owned_by(user_id) {
        return Err(ApiError::Forbidden("Only the project owner can change its configuration".into()));
    }

    let mut config = project.custom_config;
    if !config.is_object() {
        config = Value::Object(Default::default());
    }
    merge_config(&mut config, patch);

    store.set_project_config(project_id, &config).await?;
    info!(project_id, user_id, "Project configuration updated");

    Ok(config)
}
