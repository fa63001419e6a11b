use rusqlite::{Connection, params};
use storyshelf_types::api::StoryFields;

use crate::models::{StoryRow, UserRow};
use crate::{Database, Result, timestamp_now};

impl Database {
    // -- Users --

    /// Inserts a user and returns its id. A taken username surfaces as
    /// `DbError::Conflict`.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
                params![username, password_hash, timestamp_now()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Stories --

    /// All stories with their owner's username, most recently updated first.
    pub fn list_stories(&self) -> Result<Vec<StoryRow>> {
        self.with_conn(query_stories)
    }

    pub fn get_story_owner(&self, story_id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id FROM stories WHERE id = ?1",
                [story_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn insert_story(&self, owner_id: i64, story: &StoryFields) -> Result<i64> {
        let tags_json = serde_json::to_string(&story.tags)?;
        let chapters_json = serde_json::to_string(&story.chapters)?;
        let now = timestamp_now();

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO stories
                 (user_id, title, author, fandom, rating, status, summary, series,
                  tags_json, chapters_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                params![
                    owner_id,
                    story.title,
                    story.author,
                    story.fandom,
                    story.rating,
                    story.status,
                    story.summary,
                    story.series,
                    tags_json,
                    chapters_json,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Rewrites every mutable column and bumps `updated_at`. Owner and
    /// `created_at` are never touched. Returns false if no such story.
    pub fn update_story(&self, story_id: i64, story: &StoryFields) -> Result<bool> {
        let tags_json = serde_json::to_string(&story.tags)?;
        let chapters_json = serde_json::to_string(&story.chapters)?;

        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE stories SET
                    title = ?1, author = ?2, fandom = ?3, rating = ?4, status = ?5,
                    summary = ?6, series = ?7, tags_json = ?8, chapters_json = ?9,
                    updated_at = ?10
                 WHERE id = ?11",
                params![
                    story.title,
                    story.author,
                    story.fandom,
                    story.rating,
                    story.status,
                    story.summary,
                    story.series,
                    tags_json,
                    chapters_json,
                    timestamp_now(),
                    story_id,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes a story together with every bookmark that points at it.
    pub fn delete_story(&self, story_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM bookmarks WHERE story_id = ?1", [story_id])?;
            let changed = tx.execute("DELETE FROM stories WHERE id = ?1", [story_id])?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    // -- Bookmarks --

    pub fn list_bookmarks(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT story_id FROM bookmarks WHERE user_id = ?1 ORDER BY story_id")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    /// `DbError::Conflict` if already bookmarked, `DbError::MissingReference`
    /// if the story does not exist.
    pub fn add_bookmark(&self, user_id: i64, story_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO bookmarks (user_id, story_id, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, story_id, timestamp_now()],
            )?;
            Ok(())
        })
    }

    pub fn remove_bookmark(&self, user_id: i64, story_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM bookmarks WHERE user_id = ?1 AND story_id = ?2",
                params![user_id, story_id],
            )?;
            Ok(())
        })
    }

    // -- Subscriptions --

    pub fn list_subscriptions(&self, user_id: i64) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT author FROM author_subscriptions WHERE user_id = ?1 ORDER BY author ASC",
            )?;
            let authors = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(authors)
        })
    }

    /// `DbError::Conflict` if the user already follows this author.
    pub fn add_subscription(&self, user_id: i64, author: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO author_subscriptions (user_id, author, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, author, timestamp_now()],
            )?;
            Ok(())
        })
    }

    pub fn remove_subscription(&self, user_id: i64, author: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM author_subscriptions WHERE user_id = ?1 AND author = ?2",
                params![user_id, author],
            )?;
            Ok(())
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash FROM users WHERE username = ?1",
    )?;

    stmt.query_row([username], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
        })
    })
    .optional()
}

fn query_stories(conn: &Connection) -> Result<Vec<StoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, u.username, s.title, s.author, s.fandom, s.rating,
                s.status, s.summary, s.series, s.tags_json, s.chapters_json,
                s.created_at, s.updated_at
         FROM stories s
         JOIN users u ON u.id = s.user_id
         ORDER BY s.updated_at DESC, s.id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(StoryRow {
                id: row.get(0)?,
                owner_username: row.get(1)?,
                title: row.get(2)?,
                author: row.get(3)?,
                fandom: row.get(4)?,
                rating: row.get(5)?,
                status: row.get(6)?,
                summary: row.get(7)?,
                series: row.get(8)?,
                tags_json: row.get(9)?,
                chapters_json: row.get(10)?,
                created_at: row.get(11)?,
                updated_at: row.get(12)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
