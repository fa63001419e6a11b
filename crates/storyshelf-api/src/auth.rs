use std::sync::{Arc, OnceLock};

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use tracing::{error, info, warn};

use storyshelf_db::{Database, DbError};
use storyshelf_types::api::{AuthResponse, LoginRequest, MeResponse, OkResponse, SignupRequest};

use crate::error::{ApiError, run_blocking};
use crate::session::{
    SessionStore, SessionUser, clear_session_cookie, session_cookie, token_from_headers,
};

/// bcrypt work factor for stored password hashes.
pub const PASSWORD_HASH_COST: u32 = 12;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: Arc<dyn SessionStore>,
    pub password_cost: u32,
    pub cookie_secure: bool,
}

impl AppStateInner {
    /// Resolves the caller's session cookie to an identity, if any.
    pub fn current_user(&self, headers: &HeaderMap) -> Option<SessionUser> {
        token_from_headers(headers).and_then(|token| self.sessions.get(&token))
    }

    /// Replaces whatever session the caller held with a new one and
    /// returns the `Set-Cookie` value for it.
    fn start_session(&self, headers: &HeaderMap, user: SessionUser) -> String {
        if let Some(old) = token_from_headers(headers) {
            self.sessions.destroy(&old);
        }
        let token = self.sessions.create(user);
        session_cookie(&token, self.cookie_secure)
    }
}

/// Usernames and followed author names are compared trimmed and lowercased.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

/// Hash checked when a login names no existing user, so unknown and
/// known usernames cost the same bcrypt work. Computed once per process
/// at the cost of the first caller.
fn dummy_hash(cost: u32) -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        bcrypt::hash("storyshelf-no-such-user", cost).unwrap_or_else(|e| {
            error!("Dummy password hashing failed: {}", e);
            String::new()
        })
    })
}

pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let (Some(username), Some(password)) = (required(req.username), required(req.password))
    else {
        return Err(ApiError::Validation("Missing fields"));
    };

    let username = normalize_name(&username);
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::Validation("Username too short"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("Password too short"));
    }

    let db = state.clone();
    let name = username.clone();
    let user_id = run_blocking(move || {
        let password_hash = bcrypt::hash(&password, db.password_cost).map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })?;

        db.db
            .create_user(&name, &password_hash)
            .map_err(|e| match e {
                DbError::Conflict => ApiError::Conflict("Username already exists"),
                other => other.into(),
            })
    })
    .await
    .inspect_err(|e| {
        if matches!(e, ApiError::Conflict(_)) {
            warn!("Signup rejected, username taken: {}", username);
        }
    })?;

    let cookie = state.start_session(
        &headers,
        SessionUser {
            user_id,
            username: username.clone(),
        },
    );

    info!("User signed up: {} (id {})", username, user_id);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { ok: true, username }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let (Some(username), Some(password)) = (required(req.username), required(req.password))
    else {
        return Err(ApiError::Validation("Missing fields"));
    };

    let username = normalize_name(&username);

    let db = state.clone();
    let name = username.clone();
    let verified = run_blocking(move || {
        let Some(user) = db.db.get_user_by_username(&name)? else {
            let _ = bcrypt::verify(&password, dummy_hash(db.password_cost));
            return Ok(None);
        };

        let matches = bcrypt::verify(&password, &user.password_hash).map_err(|e| {
            error!("Stored hash for user {} is unreadable: {}", user.id, e);
            ApiError::Internal
        })?;

        Ok(matches.then_some(SessionUser {
            user_id: user.id,
            username: user.username,
        }))
    })
    .await?;

    let Some(user) = verified else {
        warn!("Failed login for {}", username);
        return Err(ApiError::InvalidCredentials);
    };

    let username = user.username.clone();
    let cookie = state.start_session(&headers, user);

    info!("User logged in: {}", username);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { ok: true, username }),
    ))
}

/// Always succeeds, whether or not the caller had a session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.destroy(&token);
    }

    (
        [(header::SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        Json(OkResponse::ok()),
    )
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<MeResponse> {
    match state.current_user(&headers) {
        Some(user) => Json(MeResponse::user(user.username)),
        None => Json(MeResponse::anonymous()),
    }
}
