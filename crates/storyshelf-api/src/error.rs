use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storyshelf_db::DbError;
use storyshelf_types::api::ErrorResponse;
use tracing::{error, warn};

/// Every failure a handler can report. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    /// Same message whether the user is unknown or the password is wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Not your story")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCredentials | Self::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Storage failures the handler did not map explicitly are server faults.
impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        error!("Database error: {}", e);
        Self::Internal
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::Validation("Malformed request body")
    }
}

/// Runs blocking work (SQLite, bcrypt) off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?
}
