use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Creates every table if absent. Safe to run on each startup, including
/// against a database file written by an earlier deployment.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stories (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            author          TEXT NOT NULL,
            fandom          TEXT,
            rating          TEXT,
            status          TEXT,
            summary         TEXT,
            series          TEXT,
            tags_json       TEXT NOT NULL,
            chapters_json   TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_stories_updated
            ON stories(updated_at);

        CREATE TABLE IF NOT EXISTS bookmarks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            story_id        INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
            created_at      TEXT NOT NULL,
            UNIQUE(user_id, story_id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookmarks_story
            ON bookmarks(story_id);

        CREATE TABLE IF NOT EXISTS author_subscriptions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            author          TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            UNIQUE(user_id, author)
        );
        ",
    )?;

    info!("Database schema ready");
    Ok(())
}
