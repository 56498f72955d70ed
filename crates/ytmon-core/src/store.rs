//! The `VideoStore` trait and its query/filter types.
//!
//! Implemented by `ytmon-db` (Postgres) and by [`crate::MemoryStore`].
//! Ingestion paths and the query facade depend only on this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::video::VideoRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("datastore unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("datastore call `{operation}` timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

/// Predicate shared by [`VideoStore::find`] and [`VideoStore::count`].
///
/// Text filters are case-insensitive substring matches. `limit` is ignored by
/// `count`.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Matched against `title` OR `description`.
    pub keyword: Option<String>,
    pub channel_name: Option<String>,
    /// Inclusive lower bound on `published_at`.
    pub published_since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl VideoFilter {
    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    #[must_use]
    pub fn channel_name(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = Some(channel_name.into());
        self
    }

    #[must_use]
    pub fn published_since(mut self, since: DateTime<Utc>) -> Self {
        self.published_since = Some(since);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the predicate against a record in memory.
    #[must_use]
    pub fn matches(&self, record: &VideoRecord) -> bool {
        let contains = |field: Option<&str>, needle: &str| {
            field.is_some_and(|f| f.to_lowercase().contains(&needle.to_lowercase()))
        };

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            if !contains(record.title.as_deref(), keyword)
                && !contains(record.description.as_deref(), keyword)
            {
                return false;
            }
        }

        if let Some(channel) = self.channel_name.as_deref().filter(|c| !c.is_empty()) {
            if !contains(record.channel_name.as_deref(), channel) {
                return false;
            }
        }

        if let Some(since) = self.published_since {
            if record.published_at < since {
                return false;
            }
        }

        true
    }
}

/// Persistence for [`VideoRecord`]s keyed by `video_id`.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert the record, or overwrite every ingested field of the existing
    /// record with the same `video_id`. Reserved enrichment fields are only
    /// overwritten when the incoming record sets them.
    async fn upsert(&self, record: &VideoRecord) -> Result<(), StoreError>;

    /// At most `limit` records, newest `published_at` first; ties in
    /// first-insertion order.
    async fn get_recent(&self, limit: i64) -> Result<Vec<VideoRecord>, StoreError>;

    /// Records matching `filter`, ordered like [`VideoStore::get_recent`].
    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError>;

    async fn count(&self, filter: &VideoFilter) -> Result<i64, StoreError>;

    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record() -> VideoRecord {
        let mut r = VideoRecord::new(
            "dQw4w9WgXcQ",
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        );
        r.title = Some("Markets Wrap: Stocks Rally".to_string());
        r.description = Some("Coverage of the USA open".to_string());
        r.channel_name = Some("Bloomberg Markets".to_string());
        r
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(VideoFilter::default().matches(&record()));
    }

    #[test]
    fn keyword_matches_title_or_description_case_insensitively() {
        assert!(VideoFilter::default().keyword("RALLY").matches(&record()));
        assert!(VideoFilter::default().keyword("usa").matches(&record()));
        assert!(!VideoFilter::default().keyword("bonds").matches(&record()));
    }

    #[test]
    fn channel_name_is_substring_match() {
        assert!(VideoFilter::default().channel_name("markets").matches(&record()));
        assert!(!VideoFilter::default().channel_name("cnn").matches(&record()));
    }

    #[test]
    fn channel_filter_excludes_records_without_channel() {
        let mut r = record();
        r.channel_name = None;
        assert!(!VideoFilter::default().channel_name("markets").matches(&r));
    }

    #[test]
    fn published_since_is_inclusive() {
        let r = record();
        assert!(VideoFilter::default()
            .published_since(r.published_at)
            .matches(&r));
        assert!(!VideoFilter::default()
            .published_since(r.published_at + Duration::seconds(1))
            .matches(&r));
    }
}
