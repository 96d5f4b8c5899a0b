//! Profile sanitization and persistence
//!
//! The client sends whatever JSON its form produced. Only the enumerated
//! fields are kept; a client-supplied `id` is ignored because the profile is
//! always keyed by the authenticated identity.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::db::schemas::{Expertise, ProfileUpdate};
use crate::db::FeedbackStore;
use crate::types::{ApiError, Result};

/// Coerce a JSON scalar to a string; anything else becomes empty
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Accept `{ "fields": [...] }` or a bare array; drop non-string entries
fn coerce_expertise(value: Option<&Value>) -> Expertise {
    let fields = match value {
        Some(Value::Object(map)) => map.get("fields").and_then(Value::as_array),
        Some(Value::Array(items)) => Some(items),
        _ => None,
    };

    Expertise {
        fields: fields
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Build the update record from a raw request payload
pub fn sanitize_profile(payload: &Value) -> Result<ProfileUpdate> {
    let Value::Object(fields) = payload else {
        return Err(ApiError::BadRequest("Profile payload must be a JSON object".into()));
    };

    Ok(ProfileUpdate {
        nickname: coerce_string(fields.get("nickname")),
        gender: coerce_string(fields.get("gender")),
        age_group: coerce_string(fields.get("age_group")),
        occupation: coerce_string(fields.get("occupation")),
        expertise: coerce_expertise(fields.get("expertise")),
        updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Sanitize and write the caller's profile
pub async fn save_profile(
    store: &dyn FeedbackStore,
    user_id: &str,
    payload: &Value,
) -> Result<ProfileUpdate> {
    let update = sanitize_profile(payload)?;
    store.upsert_profile(user_id, &update).await?;
    Ok(update)
}
