//! Checks that run ahead of a handler's own work and can cut the request
//! short with 404 or 409.

use serde_json::Value;
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    store::MovieStore,
};

/// Resolves the `:id` path segment to an existing movie. Ids that are not
/// integers can never match a row and are reported the same way.
pub async fn movie_exists(store: &MovieStore, raw_id: &str) -> AppResult<movie::Model> {
    let Ok(id) = raw_id.trim().parse::<i32>() else {
        debug!(id = raw_id, "non-numeric movie id");
        return Err(AppError::movie_not_found(raw_id));
    };

    match store.find(id).await? {
        Some(movie) => Ok(movie),
        None => {
            debug!(id, "movie not found");
            Err(AppError::movie_not_found(id))
        },
    }
}

/// Rejects a body whose `name` already belongs to a movie, including the one
/// being updated.
pub async fn name_is_free(store: &MovieStore, body: &Value) -> AppResult<()> {
    let Some(name) = body.get("name").and_then(Value::as_str) else {
        return Ok(());
    };

    match store.find_by_name(name).await? {
        Some(existing) => {
            debug!(name, existing_id = existing.id, "duplicate movie name");
            Err(AppError::duplicate_name(name))
        },
        None => Ok(()),
    }
}
