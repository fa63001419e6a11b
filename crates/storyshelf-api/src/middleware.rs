use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;

/// Resolve the session cookie and attach the caller's `SessionUser` to the
/// request. Anything short of a live session is a 401.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.current_user(req.headers()).ok_or_else(|| {
        debug!("No session for {} {}", req.method(), req.uri().path());
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
