use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use tracing::debug;

use storyshelf_db::DbError;
use storyshelf_types::api::OkResponse;

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::session::SessionUser;
use crate::stories::story_id_from;

/// Story ids the caller has bookmarked.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Vec<i64>>, ApiError> {
    let db = state.clone();
    let ids = run_blocking(move || Ok(db.db.list_bookmarks(user.user_id)?)).await?;
    Ok(Json(ids))
}

/// Bookmarking twice is fine; the second call changes nothing.
pub async fn add_bookmark(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    story_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let story_id = story_id_from(story_id)?;

    let db = state.clone();
    run_blocking(move || match db.db.add_bookmark(user.user_id, story_id) {
        Ok(()) => Ok(()),
        Err(DbError::Conflict) => {
            debug!("Story {} already bookmarked by {}", story_id, user.username);
            Ok(())
        }
        Err(DbError::MissingReference) => Err(ApiError::NotFound),
        Err(e) => Err(e.into()),
    })
    .await?;

    Ok(Json(OkResponse::ok()))
}

pub async fn remove_bookmark(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    story_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    // An id that cannot exist is trivially not bookmarked.
    let Ok(story_id) = story_id_from(story_id) else {
        return Ok(Json(OkResponse::ok()));
    };

    let db = state.clone();
    run_blocking(move || Ok(db.db.remove_bookmark(user.user_id, story_id)?)).await?;

    Ok(Json(OkResponse::ok()))
}
