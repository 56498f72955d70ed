//! Database operations for the `videos` table.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use ytmon_core::{StoreError, VideoFilter, VideoRecord, VideoStore};

const SELECT_COLUMNS: &str = "id, video_id, title, url, published_at, view_count, like_count, \
     description, channel_id, channel_name, ai_summary, tags";

/// A row from the `videos` table.
///
/// `id` is the insertion-order surrogate and never leaves this crate.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub video_id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub ai_summary: Option<String>,
    pub tags: Option<serde_json::Value>,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        Self {
            video_id: row.video_id,
            title: row.title,
            url: row.url,
            published_at: row.published_at,
            view_count: row.view_count,
            like_count: row.like_count,
            description: row.description,
            channel_id: row.channel_id,
            channel_name: row.channel_name,
            ai_summary: row.ai_summary,
            tags: row.tags,
        }
    }
}

/// Build a case-insensitive `ILIKE` substring pattern, escaping the LIKE
/// metacharacters in `needle`.
#[must_use]
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Postgres-backed [`VideoStore`]. Every call is bounded by
/// `statement_timeout`; a call that exceeds it fails with
/// [`StoreError::Timeout`].
#[derive(Debug, Clone)]
pub struct PgVideoStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgVideoStore {
    #[must_use]
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(operation, error = %e, "video store call failed");
                Err(StoreError::Unavailable(Box::new(e)))
            }
            Err(_) => Err(StoreError::Timeout {
                operation,
                secs: self.statement_timeout.as_secs(),
            }),
        }
    }
}

/// Bind values for the shared `find`/`count` predicate.
struct FilterBinds {
    keyword: Option<String>,
    channel_name: Option<String>,
    published_since: Option<DateTime<Utc>>,
}

impl From<&VideoFilter> for FilterBinds {
    fn from(filter: &VideoFilter) -> Self {
        Self {
            keyword: filter
                .keyword
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(like_pattern),
            channel_name: filter
                .channel_name
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(like_pattern),
            published_since: filter.published_since,
        }
    }
}

const FILTER_PREDICATE: &str = "($1::TEXT IS NULL OR title ILIKE $1 OR description ILIKE $1) \
       AND ($2::TEXT IS NULL OR channel_name ILIKE $2) \
       AND ($3::timestamptz IS NULL OR published_at >= $3)";

#[async_trait]
impl VideoStore for PgVideoStore {
    /// Upserts a video row.
    ///
    /// Conflicts on `video_id` overwrite every ingested column; `ai_summary`
    /// and `tags` keep their stored values unless the incoming record sets
    /// them. The surrogate `id` is untouched, so first-insertion order is
    /// stable.
    async fn upsert(&self, record: &VideoRecord) -> Result<(), StoreError> {
        let query = sqlx::query(
            "INSERT INTO videos \
                 (video_id, title, url, published_at, view_count, like_count, \
                  description, channel_id, channel_name, ai_summary, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (video_id) DO UPDATE SET \
                 title        = EXCLUDED.title, \
                 url          = EXCLUDED.url, \
                 published_at = EXCLUDED.published_at, \
                 view_count   = EXCLUDED.view_count, \
                 like_count   = EXCLUDED.like_count, \
                 description  = EXCLUDED.description, \
                 channel_id   = EXCLUDED.channel_id, \
                 channel_name = EXCLUDED.channel_name, \
                 ai_summary   = COALESCE(EXCLUDED.ai_summary, videos.ai_summary), \
                 tags         = COALESCE(EXCLUDED.tags, videos.tags), \
                 updated_at   = NOW()",
        )
        .bind(&record.video_id)
        .bind(&record.title)
        .bind(&record.url)
        .bind(record.published_at)
        .bind(record.view_count)
        .bind(record.like_count)
        .bind(&record.description)
        .bind(&record.channel_id)
        .bind(&record.channel_name)
        .bind(&record.ai_summary)
        .bind(&record.tags);

        self.bounded("upsert", query.execute(&self.pool)).await?;
        Ok(())
    }

    async fn get_recent(&self, limit: i64) -> Result<Vec<VideoRecord>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM videos \
             ORDER BY published_at DESC, id ASC \
             LIMIT $1"
        );
        let rows = self
            .bounded(
                "get_recent",
                sqlx::query_as::<_, VideoRow>(&sql)
                    .bind(limit.max(0))
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(VideoRecord::from).collect())
    }

    async fn find(&self, filter: &VideoFilter) -> Result<Vec<VideoRecord>, StoreError> {
        let binds = FilterBinds::from(filter);
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM videos \
             WHERE {FILTER_PREDICATE} \
             ORDER BY published_at DESC, id ASC \
             LIMIT $4"
        );
        let rows = self
            .bounded(
                "find",
                sqlx::query_as::<_, VideoRow>(&sql)
                    .bind(binds.keyword)
                    .bind(binds.channel_name)
                    .bind(binds.published_since)
                    .bind(filter.limit.map(|l| l.max(0)))
                    .fetch_all(&self.pool),
            )
            .await?;
        Ok(rows.into_iter().map(VideoRecord::from).collect())
    }

    async fn count(&self, filter: &VideoFilter) -> Result<i64, StoreError> {
        let binds = FilterBinds::from(filter);
        let sql = format!("SELECT COUNT(*) FROM videos WHERE {FILTER_PREDICATE}");
        self.bounded(
            "count",
            sqlx::query_scalar::<_, i64>(&sql)
                .bind(binds.keyword)
                .bind(binds.channel_name)
                .bind(binds.published_since)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", crate::ping(&self.pool)).await
    }
}
