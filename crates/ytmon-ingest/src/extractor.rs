//! Metadata extraction via an external `yt-dlp` process.
//!
//! The extractor is only ever asked for metadata (`--skip-download`). Its
//! JSON output is loosely typed, so every field of [`RawVideoInfo`] is
//! optional and unknown keys are ignored.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::IngestError;

/// The subset of an extractor info document this crate reads. Used both for
/// single videos and for flat channel listings (where `entries` is set).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawVideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub webpage_url: Option<String>,
    pub url: Option<String>,
    pub upload_date: Option<String>,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub description: Option<String>,
    pub channel: Option<String>,
    pub channel_id: Option<String>,
    pub uploader: Option<String>,
    pub uploader_id: Option<String>,
    /// Listing entries; individual entries may be `null` for unavailable items.
    pub entries: Option<Vec<Option<RawVideoInfo>>>,
}

/// Source of raw video metadata.
///
/// `Ok(None)` means the source produced nothing for the URL (private,
/// removed, or region-blocked); callers treat it as a skip.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_video(&self, url: &str) -> Result<Option<RawVideoInfo>, IngestError>;

    /// Flat listing of at most `limit` entries, without per-entry extraction.
    async fn list_channel(
        &self,
        url: &str,
        limit: usize,
    ) -> Result<Option<RawVideoInfo>, IngestError>;
}

/// [`Extractor`] backed by the `yt-dlp` binary.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    bin: String,
    timeout: Duration,
}

impl YtDlpExtractor {
    #[must_use]
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &ytmon_core::AppConfig) -> Self {
        Self::new(
            config.extractor_bin.clone(),
            Duration::from_secs(config.extractor_timeout_secs),
        )
    }

    fn base_args() -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            "--ignore-errors".to_string(),
        ]
    }

    fn video_args(url: &str) -> Vec<String> {
        let mut args = Self::base_args();
        args.push(url.to_string());
        args
    }

    fn listing_args(url: &str, limit: usize) -> Vec<String> {
        let mut args = Self::base_args();
        args.extend([
            "--flat-playlist".to_string(),
            "--playlist-end".to_string(),
            limit.to_string(),
            url.to_string(),
        ]);
        args
    }

    async fn run(&self, url: &str, args: Vec<String>) -> Result<Option<RawVideoInfo>, IngestError> {
        let child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| IngestError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| IngestError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|source| IngestError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        parse_output(url, &output.stdout, output.status.success(), &stderr)
    }
}

/// Interpret extractor stdout. Empty output is NotFound whatever the exit
/// status; anything else must be a JSON document (or `null`).
pub(crate) fn parse_output(
    url: &str,
    stdout: &[u8],
    success: bool,
    stderr: &str,
) -> Result<Option<RawVideoInfo>, IngestError> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        if !success {
            tracing::debug!(url, stderr, "extractor produced no output");
        }
        return Ok(None);
    }
    if !success {
        tracing::warn!(url, stderr, "extractor exited non-zero with partial output");
    }
    serde_json::from_slice::<Option<RawVideoInfo>>(stdout).map_err(|source| {
        IngestError::Deserialize {
            context: format!("extractor output for {url}"),
            source,
        }
    })
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract_video(&self, url: &str) -> Result<Option<RawVideoInfo>, IngestError> {
        self.run(url, Self::video_args(url)).await
    }

    async fn list_channel(
        &self,
        url: &str,
        limit: usize,
    ) -> Result<Option<RawVideoInfo>, IngestError> {
        self.run(url, Self::listing_args(url, limit)).await
    }
}
