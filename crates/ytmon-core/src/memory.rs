//! In-process [`VideoStore`] used by tests and `--dry-run` style tooling.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{StoreError, VideoFilter, VideoStore};
use crate::video::VideoRecord;

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    rows: HashMap<String, (u64, VideoRecord)>,
}

/// A `HashMap`-backed store. Each record keeps the sequence number of its
/// first insertion, which breaks `published_at` ties the same way the
/// Postgres surrogate id does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a single record by id.
    pub async fn get(&self, video_id: &str) -> Option<VideoRecord> {
        self.inner
            .read()
            .await
            .rows
            .get(video_id)
            .map(|(_, r)| r.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn sorted(&self, filter: &VideoFilter) -> Vec<VideoRecord> {
        let inner = self.inner.read().await;
        let mut rows: Vec<&(u64, VideoRecord)> = inner
            .rows
            .values()
            .filter(|(_, r)| filter.matches(r))
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| seq_a.cmp(seq_b))
        });
        let take = filter
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l.max(0)).unwrap_or(usize::MAX));
        rows.into_iter().take(take).map(|(_, r)| r.clone()).collect()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn upsert(&self, record: &VideoRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some((_, existing)) = inner.rows.get_mut(&record.video_id) {
            let ai_summary = record.ai_summary.clone().or_else(|| existing.ai_summary.take());
            let tags = record.tags.clone().or_else(|| existing.tags.take());
            *existing = VideoRecord {
                ai_summary,
                tags,
                ..record.clone()
            };
        } else {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner
                .rows
                .insert(record.video_id.clone(), (seq, record.clone()));
        }
        Ok(())
    }

    async fn get_recent(&self, limit: i64) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self.sorted(&VideoFilter::default().limit(limit)).await)
    }

    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self.sorted(filter).await)
    }

    async fn count(&self, filter: &VideoFilter) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        let n = inner.rows.values().filter(|(_, r)| filter.matches(r)).count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn video(id: &str, views: Option<i64>) -> VideoRecord {
        let mut r = VideoRecord::new(id, Utc::now());
        r.title = Some(format!("title {id}"));
        r.view_count = views;
        r
    }

    #[tokio::test]
    async fn upsert_twice_is_idempotent() {
        let store = MemoryStore::new();
        let r = video("v1aaaaaaaaa", Some(10));
        store.upsert(&r).await.unwrap();
        store.upsert(&r).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("v1aaaaaaaaa").await, Some(r));
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let store = MemoryStore::new();
        store.upsert(&video("v1", Some(100))).await.unwrap();
        let mut second = video("v1", Some(200));
        second.title = None;
        store.upsert(&second).await.unwrap();

        let stored = store.get("v1").await.unwrap();
        assert_eq!(stored.view_count, Some(200));
        assert_eq!(stored.title, None, "full replace, not merge");
    }

    #[tokio::test]
    async fn enrichment_fields_survive_reingestion() {
        let store = MemoryStore::new();
        let mut enriched = video("v1", Some(1));
        enriched.ai_summary = Some("summary".to_string());
        store.upsert(&enriched).await.unwrap();
        store.upsert(&video("v1", Some(2))).await.unwrap();
        let stored = store.get("v1").await.unwrap();
        assert_eq!(stored.ai_summary.as_deref(), Some("summary"));
        assert_eq!(stored.view_count, Some(2));
    }

    #[tokio::test]
    async fn get_recent_orders_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (id, hours) in [("t3", 3), ("t1", 1), ("t2", 2)] {
            let r = VideoRecord::new(id, now - Duration::hours(hours));
            store.upsert(&r).await.unwrap();
        }
        let recent = store.get_recent(2).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn ties_keep_first_insertion_order() {
        let store = MemoryStore::new();
        let at = Utc::now();
        for id in ["a", "b", "c"] {
            store.upsert(&VideoRecord::new(id, at)).await.unwrap();
        }
        // Re-upserting "a" must not move it behind "b" and "c".
        store.upsert(&VideoRecord::new("a", at)).await.unwrap();
        let ids: Vec<String> = store
            .get_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.video_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn count_and_find_share_predicate() {
        let store = MemoryStore::new();
        let mut a = video("a", None);
        a.channel_name = Some("CNN".to_string());
        let mut b = video("b", None);
        b.channel_name = Some("Sky News".to_string());
        store.upsert(&a).await.unwrap();
        store.upsert(&b).await.unwrap();

        let filter = VideoFilter::default().channel_name("cnn");
        assert_eq!(store.count(&filter).await.unwrap(), 1);
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].video_id, "a");
    }
}
