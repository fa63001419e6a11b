//! Database row types. These map directly to SQLite rows and stay
//! distinct from the storyshelf-types API models.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

pub struct StoryRow {
    pub id: i64,
    pub owner_username: String,
    pub title: String,
    pub author: String,
    pub fandom: Option<String>,
    pub rating: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub series: Option<String>,
    pub tags_json: String,
    pub chapters_json: String,
    pub created_at: String,
    pub updated_at: String,
}
