//! Single-video metadata lookup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ytmon_core::{is_plausible_video_id, parse_upload_date, VideoRecord};

use crate::error::IngestError;
use crate::extractor::{Extractor, RawVideoInfo};

/// Canonical watch-page URL for a video id.
#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Turns a video id into a [`VideoRecord`] using an [`Extractor`].
#[derive(Clone)]
pub struct MetadataFetcher {
    extractor: Arc<dyn Extractor>,
}

impl MetadataFetcher {
    #[must_use]
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Fetch current metadata for `video_id`.
    ///
    /// Returns `Ok(None)` when the extractor has nothing for the video.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidVideoId`] if `video_id` is empty or not
    ///   shaped like a video id (checked before any outbound call).
    /// - Any extractor failure, unchanged.
    pub async fn fetch(&self, video_id: &str) -> Result<Option<VideoRecord>, IngestError> {
        if !is_plausible_video_id(video_id) {
            return Err(IngestError::InvalidVideoId(video_id.to_string()));
        }

        let url = watch_url(video_id);
        let Some(info) = self.extractor.extract_video(&url).await? else {
            tracing::debug!(video_id, "extractor returned no data");
            return Ok(None);
        };

        Ok(Some(record_from_info(video_id, info, Utc::now())))
    }
}

/// Map a single-video info document. A missing or implausible `id` falls
/// back to the requested one, which has already been validated.
pub(crate) fn record_from_info(
    requested_id: &str,
    info: RawVideoInfo,
    now: DateTime<Utc>,
) -> VideoRecord {
    let video_id = info
        .id
        .filter(|id| is_plausible_video_id(id))
        .unwrap_or_else(|| requested_id.to_string());
    let mut record = VideoRecord::new(
        video_id,
        parse_upload_date(info.upload_date.as_deref(), now),
    );
    record.url = info
        .webpage_url
        .or_else(|| Some(watch_url(&record.video_id)));
    record.title = info.title;
    record.view_count = info.view_count;
    record.like_count = info.like_count;
    record.description = info.description;
    record.channel_id = info.channel_id.or(info.uploader_id);
    record.channel_name = info.channel.or(info.uploader);
    record
}
