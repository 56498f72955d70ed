//! Push-notification handling: parse the feed, fetch each announced video,
//! and upsert it.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use ytmon_core::VideoStore;

use crate::error::{IngestError, NotificationError};
use crate::feed::{parse_notification, FeedEntry};
use crate::fetcher::MetadataFetcher;

/// Per-notification counts, returned alongside the `received` ack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub entries: usize,
    pub upserted: usize,
    /// Entries without a video id, or whose video the extractor could not see.
    pub skipped: usize,
    pub failed: usize,
}

enum EntryOutcome {
    Upserted,
    Skipped,
    Failed,
}

#[derive(Clone)]
pub struct NotificationPipeline {
    fetcher: MetadataFetcher,
    store: Arc<dyn VideoStore>,
    max_concurrent_fetches: usize,
}

impl NotificationPipeline {
    #[must_use]
    pub fn new(
        fetcher: MetadataFetcher,
        store: Arc<dyn VideoStore>,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            fetcher,
            store,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// Process one notification body.
    ///
    /// # Errors
    ///
    /// Only a body that cannot be parsed as a feed is an error. Failures on
    /// individual entries are logged and counted in the report.
    pub async fn handle_notification(
        &self,
        body: &[u8],
    ) -> Result<NotificationReport, NotificationError> {
        let entries = parse_notification(body)?;
        let mut report = NotificationReport {
            entries: entries.len(),
            ..NotificationReport::default()
        };

        let outcomes: Vec<EntryOutcome> = stream::iter(entries)
            .map(|entry| self.process_entry(entry))
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                EntryOutcome::Upserted => report.upserted += 1,
                EntryOutcome::Skipped => report.skipped += 1,
                EntryOutcome::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            entries = report.entries,
            upserted = report.upserted,
            skipped = report.skipped,
            failed = report.failed,
            "notification processed"
        );
        Ok(report)
    }

    async fn process_entry(&self, entry: FeedEntry) -> EntryOutcome {
        let Some(video_id) = entry.video_id else {
            tracing::debug!(title = ?entry.title, "notification entry has no video id");
            return EntryOutcome::Skipped;
        };
        tracing::info!(video_id = %video_id, "new video notification");

        match self.ingest(&video_id).await {
            Ok(true) => EntryOutcome::Upserted,
            Ok(false) => EntryOutcome::Skipped,
            Err(IngestError::InvalidVideoId(id)) => {
                tracing::warn!(video_id = %id, "ignoring implausible video id");
                EntryOutcome::Skipped
            }
            Err(e) => {
                tracing::error!(
                    video_id = %video_id,
                    error = %e,
                    "failed to ingest notified video"
                );
                EntryOutcome::Failed
            }
        }
    }

    /// `Ok(false)` when the fetcher found nothing to store.
    async fn ingest(&self, video_id: &str) -> Result<bool, IngestError> {
        let Some(record) = self.fetcher.fetch(video_id).await? else {
            tracing::info!(video_id, "video not available, skipping");
            return Ok(false);
        };
        self.store.upsert(&record).await?;
        tracing::info!(video_id, title = ?record.title, "stored video");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Extractor;
    use crate::fetcher::watch_url;
    use crate::testing::{video, Canned, FakeExtractor, FlakyStore};
    use chrono::{TimeZone, Utc};
    use ytmon_core::MemoryStore;

    fn pipeline(extractor: FakeExtractor, store: Arc<MemoryStore>) -> NotificationPipeline {
        let extractor: Arc<dyn Extractor> = Arc::new(extractor);
        NotificationPipeline::new(MetadataFetcher::new(extractor), store, 4)
    }

    fn feed(ids: &[&str]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| format!("<entry><yt:videoId>{id}</yt:videoId><title>{id}</title></entry>"))
            .collect();
        format!(
            r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns="http://www.w3.org/2005/Atom">{entries}</feed>"#
        )
    }

    fn three_videos() -> FakeExtractor {
        FakeExtractor::new()
            .with_video("aaaaaaaaaaa", video("aaaaaaaaaaa", "one", Some("20240101")))
            .with_video("bbbbbbbbbbb", video("bbbbbbbbbbb", "two", Some("20240102")))
            .with_video("ccccccccccc", video("ccccccccccc", "three", Some("20240103")))
    }

    #[tokio::test]
    async fn single_entry_is_upserted() {
        let store = Arc::new(MemoryStore::new());
        let report = pipeline(three_videos(), store.clone())
            .handle_notification(feed(&["aaaaaaaaaaa"]).as_bytes())
            .await
            .unwrap();

        assert_eq!(report.upserted, 1);
        let stored = store.get("aaaaaaaaaaa").await.unwrap();
        assert_eq!(
            stored.published_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn single_and_multi_entry_feeds_store_the_same_rows() {
        let one_by_one = Arc::new(MemoryStore::new());
        let p = pipeline(three_videos(), one_by_one.clone());
        for id in ["aaaaaaaaaaa", "bbbbbbbbbbb"] {
            p.handle_notification(feed(&[id]).as_bytes()).await.unwrap();
        }

        let batched = Arc::new(MemoryStore::new());
        pipeline(three_videos(), batched.clone())
            .handle_notification(feed(&["aaaaaaaaaaa", "bbbbbbbbbbb"]).as_bytes())
            .await
            .unwrap();

        assert_eq!(
            one_by_one.get_recent(10).await.unwrap(),
            batched.get_recent(10).await.unwrap()
        );
    }

    #[tokio::test]
    async fn one_failing_fetch_does_not_block_the_others() {
        let extractor = three_videos().with(&watch_url("bbbbbbbbbbb"), Canned::Timeout);
        let store = Arc::new(MemoryStore::new());

        let report = pipeline(extractor, store.clone())
            .handle_notification(feed(&["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]).as_bytes())
            .await
            .unwrap();

        assert_eq!(
            report,
            NotificationReport {
                entries: 3,
                upserted: 2,
                skipped: 0,
                failed: 1,
            }
        );
        assert!(store.get("aaaaaaaaaaa").await.is_some());
        assert!(store.get("bbbbbbbbbbb").await.is_none());
        assert!(store.get("ccccccccccc").await.is_some());
    }

    #[tokio::test]
    async fn store_failure_for_one_entry_does_not_block_the_others() {
        let store = Arc::new(FlakyStore::failing_on(&["bbbbbbbbbbb"]));
        let extractor: Arc<dyn Extractor> = Arc::new(three_videos());

        let report = NotificationPipeline::new(MetadataFetcher::new(extractor), store.clone(), 4)
            .handle_notification(feed(&["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]).as_bytes())
            .await
            .unwrap();

        assert_eq!(
            report,
            NotificationReport {
                entries: 3,
                upserted: 2,
                skipped: 0,
                failed: 1,
            }
        );
        assert_eq!(store.inner.len().await, 2);
        assert!(store.inner.get("bbbbbbbbbbb").await.is_none());
    }

    #[tokio::test]
    async fn missing_ids_and_unavailable_videos_are_skipped() {
        let body = r#"<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015">
  <entry><title>no id</title></entry>
  <entry><yt:videoId>zzzzzzzzzzz</yt:videoId></entry>
  <entry><yt:videoId>UCupvZG-5ko_eiXAupbDfxWw</yt:videoId></entry>
</feed>"#;
        let store = Arc::new(MemoryStore::new());

        let report = pipeline(three_videos(), store.clone())
            .handle_notification(body.as_bytes())
            .await
            .unwrap();

        assert_eq!(report.entries, 3);
        assert_eq!(report.skipped, 3);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unparseable_body_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let result = pipeline(three_videos(), store)
            .handle_notification(b"not xml at all")
            .await;
        assert!(result.is_err());
    }
}
