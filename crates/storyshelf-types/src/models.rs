use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A chapter is an arbitrary JSON object supplied by the client.
/// The server only cares that a story has at least one of them.
pub type Chapter = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_RATING: &str = "T";
pub const DEFAULT_STATUS: &str = "Ongoing";

/// A story as returned by the public listing, annotated with the
/// owning user's username.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub author: String,
    pub fandom: String,
    pub rating: String,
    pub status: String,
    pub summary: String,
    pub series: String,
    pub tags: Vec<String>,
    pub chapters: Vec<Chapter>,
    #[serde(serialize_with = "millis_utc")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "millis_utc")]
    pub updated_at: DateTime<Utc>,
}

/// Timestamps go out in the stored form: millisecond precision, `Z` suffix.
fn millis_utc<S: Serializer>(at: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_keep_zero_millis() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap();
        let story = Story {
            id: 1,
            owner: "alice".into(),
            title: "T".into(),
            author: "A".into(),
            fandom: String::new(),
            rating: DEFAULT_RATING.into(),
            status: DEFAULT_STATUS.into(),
            summary: String::new(),
            series: String::new(),
            tags: Vec::new(),
            chapters: Vec::new(),
            created_at: at,
            updated_at: at,
        };

        let body = serde_json::to_value(&story).unwrap();
        assert_eq!(body["createdAt"], "2024-03-01T12:00:05.000Z");
        assert_eq!(body["updatedAt"], "2024-03-01T12:00:05.000Z");

        let back: Story = serde_json::from_value(body).unwrap();
        assert_eq!(back.created_at, at);
    }
}
