//! Canonical video record and the identifier/date rules every ingestion path
//! applies before a record reaches the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Length of a `YouTube` video identifier. Channel ids (`UC…`) are 24.
pub const VIDEO_ID_LEN: usize = 11;

const CHANNEL_ID_LEN: usize = 24;

/// A single published video, keyed by `video_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: Option<String>,
    /// Canonical watch URL, e.g. `"https://www.youtube.com/watch?v=dQw4w9WgXcQ"`.
    pub url: Option<String>,
    /// Upload date from the source, or ingestion time when the source has none.
    pub published_at: DateTime<Utc>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    /// Reserved for later enrichment; ingestion never sets it.
    pub ai_summary: Option<String>,
    /// Reserved for later enrichment; ingestion never sets it.
    pub tags: Option<serde_json::Value>,
}

impl VideoRecord {
    /// A record carrying only an id and a publish time, all other fields empty.
    #[must_use]
    pub fn new(video_id: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            video_id: video_id.into(),
            title: None,
            url: None,
            published_at,
            view_count: None,
            like_count: None,
            description: None,
            channel_id: None,
            channel_name: None,
            ai_summary: None,
            tags: None,
        }
    }
}

/// External representation of a [`VideoRecord`]: no storage identifiers and
/// `published_at` rendered as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoView {
    pub video_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: String,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub ai_summary: Option<String>,
    pub tags: Option<serde_json::Value>,
}

impl From<VideoRecord> for VideoView {
    fn from(record: VideoRecord) -> Self {
        Self {
            video_id: record.video_id,
            title: record.title,
            url: record.url,
            published_at: record.published_at.to_rfc3339(),
            view_count: record.view_count,
            like_count: record.like_count,
            description: record.description,
            channel_id: record.channel_id,
            channel_name: record.channel_name,
            ai_summary: record.ai_summary,
            tags: record.tags,
        }
    }
}

/// Returns `true` if `id` looks like a video id rather than a channel or
/// playlist id surfaced by a flat listing.
///
/// Accepts 1 to [`VIDEO_ID_LEN`] characters from the URL-safe base64 alphabet.
#[must_use]
pub fn is_plausible_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Returns `true` for a 24-character `UC`-prefixed channel id.
#[must_use]
pub fn is_plausible_channel_id(id: &str) -> bool {
    id.len() == CHANNEL_ID_LEN
        && id.starts_with("UC")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a compact `YYYYMMDD` upload date into UTC midnight of that day.
///
/// Missing or malformed input yields `now`; a record is never dropped for a
/// bad date.
#[must_use]
pub fn parse_upload_date(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.map(str::trim)
        .filter(|s| s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y%m%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |dt| dt.and_utc())
}
