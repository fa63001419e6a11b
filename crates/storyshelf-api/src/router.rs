use std::path::Path;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::bookmarks;
use crate::middleware::require_session;
use crate::stories;
use crate::subscriptions;

/// Builds the full application: JSON API under `/api`, and the static
/// client bundle from `public_dir` for every other path.
pub fn router(state: AppState, public_dir: impl AsRef<Path>) -> Router {
    let public_routes = Router::new()
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/api/stories", get(stories::list_stories))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/stories", post(stories::create_story))
        .route("/api/stories/{id}", put(stories::update_story))
        .route("/api/stories/{id}", delete(stories::delete_story))
        .route("/api/bookmarks", get(bookmarks::list_bookmarks))
        .route("/api/bookmarks/{story_id}", post(bookmarks::add_bookmark))
        .route("/api/bookmarks/{story_id}", delete(bookmarks::remove_bookmark))
        .route("/api/subscriptions", get(subscriptions::list_subscriptions))
        .route("/api/subscriptions/{author}", post(subscriptions::add_subscription))
        .route("/api/subscriptions/{author}", delete(subscriptions::remove_subscription))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
}
