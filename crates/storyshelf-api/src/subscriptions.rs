use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::debug;

use storyshelf_db::DbError;
use storyshelf_types::api::OkResponse;

use crate::auth::{AppState, normalize_name};
use crate::error::{ApiError, run_blocking};
use crate::session::SessionUser;

/// Authors the caller follows, alphabetically.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.clone();
    let authors = run_blocking(move || Ok(db.db.list_subscriptions(user.user_id)?)).await?;
    Ok(Json(authors))
}

pub async fn add_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(author): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let author = author_from(&author)?;

    let db = state.clone();
    run_blocking(move || match db.db.add_subscription(user.user_id, &author) {
        Ok(()) => Ok(()),
        Err(DbError::Conflict) => {
            debug!("{} already follows {}", user.username, author);
            Ok(())
        }
        Err(e) => Err(e.into()),
    })
    .await?;

    Ok(Json(OkResponse::ok()))
}

pub async fn remove_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(author): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let author = author_from(&author)?;

    let db = state.clone();
    run_blocking(move || Ok(db.db.remove_subscription(user.user_id, &author)?)).await?;

    Ok(Json(OkResponse::ok()))
}

fn author_from(raw: &str) -> Result<String, ApiError> {
    let author = normalize_name(raw);
    if author.is_empty() {
        return Err(ApiError::Validation("Missing author"));
    }
    Ok(author)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_is_normalized() {
        assert_eq!(author_from("  Jane AUSTEN ").unwrap(), "jane austen");
        assert!(matches!(author_from("   "), Err(ApiError::Validation(_))));
    }
}
