//! In-process [`Extractor`] and [`VideoStore`] doubles for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use ytmon_core::{MemoryStore, StoreError, VideoFilter, VideoRecord, VideoStore};

use crate::error::IngestError;
use crate::extractor::{Extractor, RawVideoInfo};

#[derive(Debug, Clone)]
pub(crate) enum Canned {
    Info(RawVideoInfo),
    Missing,
    Timeout,
}

#[derive(Debug, Default)]
pub(crate) struct FakeExtractor {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, url: &str, canned: Canned) -> Self {
        self.responses.insert(url.to_string(), canned);
        self
    }

    pub(crate) fn with_video(self, id: &str, info: RawVideoInfo) -> Self {
        self.with(&crate::fetcher::watch_url(id), Canned::Info(info))
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, url: &str) -> Result<Option<RawVideoInfo>, IngestError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(Canned::Info(info)) => Ok(Some(info.clone())),
            Some(Canned::Missing) | None => Ok(None),
            Some(Canned::Timeout) => Err(IngestError::Timeout {
                url: url.to_string(),
                secs: 1,
            }),
        }
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract_video(&self, url: &str) -> Result<Option<RawVideoInfo>, IngestError> {
        self.respond(url)
    }

    async fn list_channel(
        &self,
        url: &str,
        _limit: usize,
    ) -> Result<Option<RawVideoInfo>, IngestError> {
        self.respond(url)
    }
}

pub(crate) fn video(id: &str, title: &str, upload_date: Option<&str>) -> RawVideoInfo {
    RawVideoInfo {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        upload_date: upload_date.map(str::to_string),
        ..RawVideoInfo::default()
    }
}

/// A [`MemoryStore`] whose upserts fail with [`StoreError::Unavailable`] for
/// the listed video ids.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryStore,
    failing: HashSet<String>,
}

impl FlakyStore {
    pub(crate) fn failing_on(ids: &[&str]) -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: ids.iter().map(|id| (*id).to_string()).collect(),
        }
    }
}

#[async_trait]
impl VideoStore for FlakyStore {
    async fn upsert(&self, record: &VideoRecord) -> Result<(), StoreError> {
        if self.failing.contains(&record.video_id) {
            return Err(StoreError::Unavailable(
                std::io::Error::other("connection reset").into(),
            ));
        }
        self.inner.upsert(record).await
    }

    async fn get_recent(&self, limit: i64) -> Result<Vec<VideoRecord>, StoreError> {
        self.inner.get_recent(limit).await
    }

    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError> {
        self.inner.find(filter).await
    }

    async fn count(&self, filter: &VideoFilter) -> Result<i64, StoreError> {
        self.inner.count(filter).await
    }
}
