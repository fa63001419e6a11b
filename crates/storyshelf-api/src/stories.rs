use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use storyshelf_db::models::StoryRow;
use storyshelf_types::api::{CreatedResponse, OkResponse, StoryInput};
use storyshelf_types::models::{DEFAULT_RATING, DEFAULT_STATUS, Story};

use crate::auth::AppState;
use crate::error::{ApiError, run_blocking};
use crate::session::SessionUser;

/// Public listing of every story, most recently updated first.
pub async fn list_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let db = state.clone();
    let rows = run_blocking(move || Ok(db.db.list_stories()?)).await?;

    Ok(Json(rows.into_iter().map(story_from_row).collect()))
}

pub async fn create_story(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    payload: Result<Json<StoryInput>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(input) = payload?;
    let fields = input.validate().map_err(ApiError::Validation)?;

    let db = state.clone();
    let owner_id = user.user_id;
    let id = run_blocking(move || Ok(db.db.insert_story(owner_id, &fields)?)).await?;

    info!("Story {} created by {}", id, user.username);
    Ok(Json(CreatedResponse { ok: true, id }))
}

/// Owner-only. Existence and ownership are checked before the body is
/// validated, so a stranger gets 403 even for a malformed update.
pub async fn update_story(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    story_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StoryInput>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let story_id = story_id_from(story_id)?;
    ensure_owner(&state, story_id, &user).await?;

    let Json(input) = payload?;
    let fields = input.validate().map_err(ApiError::Validation)?;

    let db = state.clone();
    let updated = run_blocking(move || Ok(db.db.update_story(story_id, &fields)?)).await?;
    if !updated {
        // Deleted between the ownership check and the write.
        return Err(ApiError::NotFound);
    }

    info!("Story {} updated by {}", story_id, user.username);
    Ok(Json(OkResponse::ok()))
}

/// Owner-only. Bookmarks pointing at the story go with it.
pub async fn delete_story(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    story_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let story_id = story_id_from(story_id)?;
    ensure_owner(&state, story_id, &user).await?;

    let db = state.clone();
    run_blocking(move || Ok(db.db.delete_story(story_id)?)).await?;

    info!("Story {} deleted by {}", story_id, user.username);
    Ok(Json(OkResponse::ok()))
}

/// A path segment that is not a story id can never name a story.
pub(crate) fn story_id_from(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

async fn ensure_owner(state: &AppState, story_id: i64, user: &SessionUser) -> Result<(), ApiError> {
    let db = state.clone();
    let owner = run_blocking(move || Ok(db.db.get_story_owner(story_id)?))
        .await?
        .ok_or(ApiError::NotFound)?;

    if owner != user.user_id {
        warn!(
            "{} tried to modify story {} owned by user {}",
            user.username, story_id, owner
        );
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn story_from_row(row: StoryRow) -> Story {
    let tags = parse_json_column(&row.tags_json, "tags_json", row.id);
    let chapters = parse_json_column(&row.chapters_json, "chapters_json", row.id);
    let created_at = parse_timestamp(&row.created_at, "created_at", row.id);
    let updated_at = parse_timestamp(&row.updated_at, "updated_at", row.id);

    Story {
        id: row.id,
        owner: row.owner_username,
        title: row.title,
        author: row.author,
        fandom: row.fandom.unwrap_or_default(),
        rating: row.rating.unwrap_or_else(|| DEFAULT_RATING.to_string()),
        status: row.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        summary: row.summary.unwrap_or_default(),
        series: row.series.unwrap_or_default(),
        tags,
        chapters,
        created_at,
        updated_at,
    }
}

fn parse_json_column<T: DeserializeOwned + Default>(raw: &str, column: &str, story_id: i64) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt {} on story {}: {}", column, story_id, e);
        T::default()
    })
}

fn parse_timestamp(raw: &str, column: &str, story_id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') shape, no timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on story {}: {}", column, raw, story_id, e);
            DateTime::default()
        })
}
