//! Post records flowing through the pipeline
//!
//! `CandidateRecord` is what the search listing yields: enough to identify a post
//! and order it. `HydratedRecord` is the full-fidelity object returned by the
//! batched look-up endpoint.

use crate::{BackscrollError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp layout used by the look-up endpoint, e.g. `Wed Jan 07 11:06:00 +0000 2015`
pub const POST_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A post discovered on a search listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Post identifier
    pub tweet_id: String,

    /// Creation time as shown on the listing
    #[serde(with = "post_date")]
    pub created_at: DateTime<Utc>,

    pub user_id: String,
    pub screen_name: String,
    pub user_name: String,
    pub tweet_text: String,

    /// Language tag of the text, `NONE` when the listing omits it
    pub lang: String,

    /// Space separated hashtags found in the text
    pub hashtag: String,

    /// Counts as rendered on the page, `NA` when absent
    pub retweet_count: String,
    pub favorite_count: String,
}

impl CandidateRecord {
    /// Creates a record carrying only the fields the pipeline itself needs
    pub fn new(tweet_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            tweet_id: tweet_id.into(),
            created_at,
            user_id: String::new(),
            screen_name: String::new(),
            user_name: String::new(),
            tweet_text: String::new(),
            lang: "NONE".to_string(),
            hashtag: String::new(),
            retweet_count: "NA".to_string(),
            favorite_count: "NA".to_string(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.tweet_id
    }

    /// Joins the identifiers of `batch` the way the look-up endpoint expects them
    pub fn identifier_for(batch: &[CandidateRecord]) -> String {
        batch
            .iter()
            .map(CandidateRecord::identifier)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A post as returned by the batched look-up endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct HydratedRecord {
    pub id: String,

    /// Authoritative creation time, used for ordering
    pub created_at: DateTime<Utc>,

    /// The full object exactly as the endpoint returned it
    pub payload: Value,
}

impl HydratedRecord {
    /// Builds a record from one element of a look-up response
    ///
    /// The identifier is read from `id_str`, falling back to a numeric `id`.
    /// `created_at` must be present and in [`POST_DATE_FORMAT`].
    pub fn from_json(payload: Value) -> Result<Self> {
        let id = match payload.get("id_str").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => payload
                .get("id")
                .and_then(Value::as_u64)
                .map(|id| id.to_string())
                .ok_or_else(|| BackscrollError::MalformedRecord("missing id".to_string()))?,
        };

        let raw_date = payload
            .get("created_at")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BackscrollError::MalformedRecord(format!("record {} has no created_at", id))
            })?;

        let created_at = parse_post_date(raw_date).ok_or_else(|| {
            BackscrollError::MalformedRecord(format!(
                "record {} has unparseable created_at '{}'",
                id, raw_date
            ))
        })?;

        Ok(Self {
            id,
            created_at,
            payload,
        })
    }
}

/// Parses a timestamp in [`POST_DATE_FORMAT`]
pub fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, POST_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts listing epoch seconds into a UTC timestamp
pub fn from_epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

mod post_date {
    use super::{parse_post_date, POST_DATE_FORMAT};
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(POST_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_post_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid post date '{}'", raw)))
    }
}
