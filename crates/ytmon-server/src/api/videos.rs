use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use ytmon_core::{query, ChannelStats, RecentCount, VideoView};

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, AppState};

const DEFAULT_RECENT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 200;
const DEFAULT_WINDOW_HOURS: i64 = 24;
const MAX_WINDOW_HOURS: i64 = 24 * 30;

/// Negative limits read as zero, so a response never exceeds what was asked for.
pub(super) fn normalize_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(0, MAX_LIMIT)
}

#[derive(Debug, Deserialize)]
pub(super) struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub keyword: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    pub channel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CountRecentQuery {
    pub channel: Option<String>,
    pub keyword: Option<String>,
    pub hours: Option<i64>,
}

pub(super) async fn recent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<RecentQuery>,
) -> Result<Json<Vec<VideoView>>, ApiError> {
    let limit = normalize_limit(params.limit, DEFAULT_RECENT_LIMIT);
    query::recent_videos(state.store.as_ref(), limit)
        .await
        .map(Json)
        .map_err(|e| map_store_error(req_id.0, &e))
}

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<VideoView>>, ApiError> {
    if params.keyword.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "keyword must not be empty",
        ));
    }
    let limit = normalize_limit(params.limit, query::DEFAULT_SEARCH_LIMIT);
    query::search_videos(state.store.as_ref(), params.keyword.trim(), Some(limit))
        .await
        .map(Json)
        .map_err(|e| map_store_error(req_id.0, &e))
}

pub(super) async fn stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<ChannelStats>, ApiError> {
    query::video_stats(state.store.as_ref(), params.channel.as_deref())
        .await
        .map(Json)
        .map_err(|e| map_store_error(req_id.0, &e))
}

pub(super) async fn count_recent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<CountRecentQuery>,
) -> Result<Json<RecentCount>, ApiError> {
    let hours = params
        .hours
        .unwrap_or(DEFAULT_WINDOW_HOURS)
        .clamp(1, MAX_WINDOW_HOURS);
    query::count_recent(
        state.store.as_ref(),
        params.channel.as_deref(),
        params.keyword.as_deref(),
        Duration::hours(hours),
        Utc::now(),
    )
    .await
    .map(Json)
    .map_err(|e| map_store_error(req_id.0, &e))
}
