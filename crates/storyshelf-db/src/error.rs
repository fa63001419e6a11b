use rusqlite::{ErrorCode, ffi};
use std::ffi::c_int;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("row already exists")]
    Conflict,

    /// A FOREIGN KEY constraint rejected the write.
    #[error("referenced row does not exist")]
    MissingReference,

    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("json column error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match constraint_code(&e) {
            Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                Self::Conflict
            }
            Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Self::MissingReference,
            _ => Self::Sqlite(e),
        }
    }
}

fn constraint_code(e: &rusqlite::Error) -> Option<c_int> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Some(err.extended_code)
        }
        _ => None,
    }
}
