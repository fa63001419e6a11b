use serde::{Deserialize, Serialize};

use crate::models::{Chapter, DEFAULT_RATING, DEFAULT_STATUS};

// -- Auth --

/// Fields are optional so a missing field surfaces as a validation
/// error from the handler instead of a deserialization rejection.
/// Extra keys are ignored and scalar values are read as text.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl MeResponse {
    pub fn anonymous() -> Self {
        Self { logged_in: false, username: None }
    }

    pub fn user(username: String) -> Self {
        Self { logged_in: true, username: Some(username) }
    }
}

// -- Stories --

/// Body of `POST /api/stories` and `PUT /api/stories/{id}`.
///
/// Unknown fields are ignored so clients can send back a full story
/// object (including `id`, `owner`, timestamps) when editing.
///
/// A `tags` or `chapters` value that is null or not an array reads as
/// empty.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoryInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fandom: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "lenient::tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::chapters")]
    pub chapters: Vec<Chapter>,
}

/// A `StoryInput` that passed validation, with defaults applied.
#[derive(Debug, Clone)]
pub struct StoryFields {
    pub title: String,
    pub author: String,
    pub fandom: String,
    pub rating: String,
    pub status: String,
    pub summary: String,
    pub series: String,
    pub tags: Vec<String>,
    pub chapters: Vec<Chapter>,
}

impl StoryInput {
    /// Applies defaults for the optional text fields. Title and author
    /// must be non-blank and at least one chapter must be present.
    pub fn validate(self) -> Result<StoryFields, &'static str> {
        let title = non_blank(self.title).ok_or("Missing title/author")?;
        let author = non_blank(self.author).ok_or("Missing title/author")?;
        if self.chapters.is_empty() {
            return Err("Need at least 1 chapter");
        }

        Ok(StoryFields {
            title,
            author,
            fandom: self.fandom.unwrap_or_default(),
            rating: non_blank(self.rating).unwrap_or_else(|| DEFAULT_RATING.to_string()),
            status: non_blank(self.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            summary: self.summary.unwrap_or_default(),
            series: self.series.unwrap_or_default(),
            tags: self.tags,
            chapters: self.chapters,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Field decoders that coerce loosely typed client JSON instead of
/// rejecting the whole body.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::models::Chapter;

    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(Value::deserialize(de)?))
    }

    pub fn tags<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
            _ => Vec::new(),
        })
    }

    /// Only object entries count as chapters.
    pub fn chapters<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Chapter>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(chapter) => Some(chapter),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub ok: bool,
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
