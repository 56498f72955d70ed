//! Read-only query facade shared by the HTTP surface and the chat tool
//! functions. Results are [`VideoView`]s; nothing here writes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::store::{StoreError, VideoFilter, VideoStore};
use crate::video::VideoView;

/// Default result cap for keyword search, matching the chat tool.
pub const DEFAULT_SEARCH_LIMIT: i64 = 5;

/// Output of the `get_video_stats` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub count: i64,
    /// The requested channel filter, or `"All"` when unfiltered.
    pub channel: String,
}

/// Output of the `count_videos_last_24h` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentCount {
    pub count: i64,
    pub since: String,
    pub channel: Option<String>,
}

/// The `limit` most recently published videos.
///
/// # Errors
///
/// Propagates [`StoreError`] from the backing store.
pub async fn recent_videos(
    store: &dyn VideoStore,
    limit: i64,
) -> Result<Vec<VideoView>, StoreError> {
    let rows = store.get_recent(limit).await?;
    Ok(rows.into_iter().map(VideoView::from).collect())
}

/// Videos whose title or description contains `keyword`.
///
/// # Errors
///
/// Propagates [`StoreError`] from the backing store.
pub async fn search_videos(
    store: &dyn VideoStore,
    keyword: &str,
    limit: Option<i64>,
) -> Result<Vec<VideoView>, StoreError> {
    let filter = VideoFilter::default()
        .keyword(keyword)
        .limit(limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
    let rows = store.find(&filter).await?;
    Ok(rows.into_iter().map(VideoView::from).collect())
}

/// Number of stored videos, optionally for channels whose name contains
/// `channel_name`.
///
/// # Errors
///
/// Propagates [`StoreError`] from the backing store.
pub async fn video_stats(
    store: &dyn VideoStore,
    channel_name: Option<&str>,
) -> Result<ChannelStats, StoreError> {
    let channel_name = channel_name.filter(|c| !c.trim().is_empty());
    let mut filter = VideoFilter::default();
    if let Some(c) = channel_name {
        filter = filter.channel_name(c);
    }
    let count = store.count(&filter).await?;
    Ok(ChannelStats {
        count,
        channel: channel_name.unwrap_or("All").to_string(),
    })
}

/// Number of videos published within `window` before `now`, optionally
/// narrowed by channel name and a title/description keyword.
///
/// # Errors
///
/// Propagates [`StoreError`] from the backing store.
pub async fn count_recent(
    store: &dyn VideoStore,
    channel_name: Option<&str>,
    keyword: Option<&str>,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<RecentCount, StoreError> {
    let since = now - window;
    let mut filter = VideoFilter::default().published_since(since);
    let channel_name = channel_name.filter(|c| !c.trim().is_empty());
    if let Some(c) = channel_name {
        filter = filter.channel_name(c);
    }
    if let Some(k) = keyword.filter(|k| !k.trim().is_empty()) {
        filter = filter.keyword(k);
    }
    let count = store.count(&filter).await?;
    Ok(RecentCount {
        count,
        since: since.to_rfc3339(),
        channel: channel_name.map(str::to_string),
    })
}
