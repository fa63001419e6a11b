pub mod auth;
pub mod bookmarks;
pub mod error;
pub mod middleware;
pub mod router;
pub mod session;
pub mod stories;
pub mod subscriptions;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::router;
