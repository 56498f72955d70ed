//! Bulk import of a channel's recent uploads from a flat listing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use ytmon_core::{
    is_plausible_video_id, parse_upload_date, ChannelConfig, ChannelsFile, VideoRecord, VideoStore,
};

use crate::error::IngestError;
use crate::extractor::{Extractor, RawVideoInfo};
use crate::fetcher::watch_url;

/// Counts for one channel's backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub channel_url: String,
    /// Non-null entries in the listing.
    pub listed: usize,
    pub upserted: usize,
    /// Entries with a missing or implausible video id.
    pub rejected: usize,
    /// Repeats of an id already seen in this batch.
    pub duplicates: usize,
    /// Store failures.
    pub failed: usize,
}

/// Outcome of one channel inside [`BackfillIngestor::ingest_all`].
#[derive(Debug)]
pub enum ChannelOutcome {
    Completed(BackfillReport),
    Failed {
        channel_url: String,
        error: IngestError,
    },
}

/// Rewrite a channel URL to its uploads listing.
///
/// `/videos` is appended unless the path already ends in `/videos` or
/// `/featured`. A trailing slash is ignored.
#[must_use]
pub fn listing_url(channel_url: &str) -> String {
    let trimmed = channel_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/videos") || trimmed.ends_with("/featured") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/videos")
    }
}

pub struct BackfillIngestor {
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn VideoStore>,
    max_concurrent_channels: usize,
}

impl BackfillIngestor {
    #[must_use]
    pub fn new(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn VideoStore>,
        max_concurrent_channels: usize,
    ) -> Self {
        Self {
            extractor,
            store,
            max_concurrent_channels: max_concurrent_channels.max(1),
        }
    }

    /// Import up to `limit` recent uploads from one channel.
    ///
    /// # Errors
    ///
    /// Returns an [`IngestError`] only when the listing itself cannot be
    /// retrieved. Per-entry problems are counted in the report.
    pub async fn ingest_channel(
        &self,
        channel_url: &str,
        limit: usize,
    ) -> Result<BackfillReport, IngestError> {
        let target = listing_url(channel_url);
        tracing::info!(channel_url, target = %target, limit, "fetching channel listing");

        let listing = self
            .extractor
            .list_channel(&target, limit)
            .await?
            .unwrap_or_default();

        let records = plan_listing(listing, Utc::now());
        let mut report = BackfillReport {
            channel_url: channel_url.to_string(),
            listed: records.listed,
            rejected: records.rejected,
            duplicates: records.duplicates,
            ..BackfillReport::default()
        };

        for record in &records.records {
            match self.store.upsert(record).await {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    tracing::error!(
                        video_id = %record.video_id,
                        error = %e,
                        "failed to store backfilled video"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            channel_url,
            listed = report.listed,
            upserted = report.upserted,
            rejected = report.rejected,
            duplicates = report.duplicates,
            failed = report.failed,
            "channel backfill complete"
        );
        Ok(report)
    }

    /// Backfill every configured channel with bounded concurrency. A channel
    /// whose listing fails is logged and reported; the rest still run.
    pub async fn ingest_all(&self, channels: &ChannelsFile, limit: usize) -> Vec<ChannelOutcome> {
        self.ingest_channels(&channels.channels, limit).await
    }

    pub async fn ingest_channels(
        &self,
        channels: &[ChannelConfig],
        limit: usize,
    ) -> Vec<ChannelOutcome> {
        stream::iter(channels)
            .map(|channel| async move {
                match self.ingest_channel(&channel.url, limit).await {
                    Ok(report) => ChannelOutcome::Completed(report),
                    Err(error) => {
                        tracing::error!(
                            channel = %channel.name,
                            url = %channel.url,
                            error = %error,
                            "channel backfill failed"
                        );
                        ChannelOutcome::Failed {
                            channel_url: channel.url.clone(),
                            error,
                        }
                    }
                }
            })
            .buffer_unordered(self.max_concurrent_channels)
            .collect()
            .await
    }
}

/// Validated, batch-deduplicated records from a listing plus the counts of
/// what was dropped.
#[derive(Debug, Default)]
pub(crate) struct ListingPlan {
    pub records: Vec<VideoRecord>,
    pub listed: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

pub(crate) fn plan_listing(listing: RawVideoInfo, now: DateTime<Utc>) -> ListingPlan {
    let channel_title = listing
        .uploader
        .or(listing.channel)
        .or(listing.title);

    let mut plan = ListingPlan::default();
    let mut seen = HashSet::new();

    for entry in listing.entries.unwrap_or_default().into_iter().flatten() {
        plan.listed += 1;

        let video_id = match entry.id.as_deref() {
            Some(id) if is_plausible_video_id(id) => id.to_string(),
            other => {
                tracing::debug!(id = ?other, "skipping listing entry without a video id");
                plan.rejected += 1;
                continue;
            }
        };
        if !seen.insert(video_id.clone()) {
            plan.duplicates += 1;
            continue;
        }

        plan.records
            .push(record_from_entry(video_id, entry, channel_title.as_deref(), now));
    }
    plan
}

fn record_from_entry(
    video_id: String,
    entry: RawVideoInfo,
    channel_title: Option<&str>,
    now: DateTime<Utc>,
) -> VideoRecord {
    let mut record = VideoRecord::new(
        video_id,
        parse_upload_date(entry.upload_date.as_deref(), now),
    );
    record.url = entry
        .webpage_url
        .or(entry.url)
        .or_else(|| Some(watch_url(&record.video_id)));
    record.title = entry.title;
    record.view_count = entry.view_count;
    record.like_count = entry.like_count;
    record.description = entry.description;
    record.channel_id = entry.channel_id.or(entry.uploader_id);
    record.channel_name = entry
        .channel
        .or(entry.uploader)
        .or_else(|| channel_title.map(str::to_string));
    record
}

#[cfg(test)]
#[path = "backfill_test.rs"]
mod tests;
