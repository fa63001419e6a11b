use std::collections::HashMap;
use std::sync::Mutex;

use axum::http::HeaderMap;
use axum_extra::headers::{Cookie, HeaderMapExt};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

pub const SESSION_COOKIE: &str = "storyshelf.sid";

/// Sessions expire a fixed seven days after login.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Identity held for an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
}

/// Server-side session storage keyed by an opaque cookie token.
pub trait SessionStore: Send + Sync {
    /// Stores the identity and returns a fresh token for it.
    fn create(&self, user: SessionUser) -> String;

    /// Missing and expired tokens both resolve to `None`.
    fn get(&self, token: &str) -> Option<SessionUser>;

    fn destroy(&self, token: &str);

    /// Drops expired sessions, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

struct SessionEntry {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

/// Process-local session table. Everything is lost on restart.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, user: SessionUser) -> String {
        let token = new_token();
        let entry = SessionEntry {
            user,
            expires_at: Utc::now() + self.ttl,
        };
        self.table().insert(token.clone(), entry);
        token
    }

    fn get(&self, token: &str) -> Option<SessionUser> {
        let mut table = self.table();
        let expired = match table.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => return Some(entry.user.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            table.remove(token);
        }
        None
    }

    fn destroy(&self, token: &str) {
        self.table().remove(token);
    }

    fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut table = self.table();
        let before = table.len();
        table.retain(|_, entry| entry.expires_at > now);
        before - table.len()
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Reads the session token from the `Cookie` header, if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Cookie>()?
        .get(SESSION_COOKIE)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let max_age = Duration::days(SESSION_TTL_DAYS).num_seconds();
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};

    fn alice() -> SessionUser {
        SessionUser {
            user_id: 1,
            username: "alice".into(),
        }
    }

    #[test]
    fn create_then_get() {
        let store = MemorySessionStore::new();
        let token = store.create(alice());
        assert_eq!(store.get(&token), Some(alice()));
        assert_eq!(store.get("not-a-token"), None);
    }

    #[test]
    fn tokens_are_unique() {
        let store = MemorySessionStore::new();
        assert_ne!(store.create(alice()), store.create(alice()));
    }

    #[test]
    fn destroy_is_idempotent() {
        let store = MemorySessionStore::new();
        let token = store.create(alice());
        store.destroy(&token);
        store.destroy(&token);
        assert_eq!(store.get(&token), None);
    }

    #[test]
    fn expired_sessions_are_anonymous() {
        let store = MemorySessionStore::with_ttl(Duration::zero());
        let token = store.create(alice());
        assert_eq!(store.get(&token), None);
    }

    #[test]
    fn purge_removes_only_expired() {
        let expired = MemorySessionStore::with_ttl(Duration::zero());
        expired.create(alice());
        expired.create(alice());
        assert_eq!(expired.purge_expired(), 2);

        let live = MemorySessionStore::new();
        live.create(alice());
        assert_eq!(live.purge_expired(), 0);
    }

    #[test]
    fn token_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; storyshelf.sid=abc123"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("tok", false);
        assert!(cookie.starts_with("storyshelf.sid=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("tok", true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
