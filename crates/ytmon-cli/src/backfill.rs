//! `backfill` command: pull recent uploads for configured channels.
//!
//! Per-channel failures are logged and reported rather than propagated so a
//! single bad channel does not abort the run.

use std::sync::Arc;

use ytmon_core::{AppConfig, ChannelConfig, MemoryStore, VideoStore};
use ytmon_ingest::{BackfillIngestor, ChannelOutcome, YtDlpExtractor};

/// Resolve which channels to backfill.
///
/// # Errors
///
/// Returns an error if `channel_filter` matches no configured channel.
pub(crate) fn select_channels(
    channels: &ytmon_core::ChannelsFile,
    channel_filter: Option<&str>,
) -> anyhow::Result<Vec<ChannelConfig>> {
    match channel_filter {
        Some(url) => {
            let selected = channels.only(url);
            if selected.is_empty() {
                anyhow::bail!("channel '{url}' is not listed in the channels file");
            }
            Ok(selected)
        }
        None => Ok(channels.channels.clone()),
    }
}

/// Run a backfill and print one summary line per channel.
///
/// # Errors
///
/// Returns an error if the channels file cannot be loaded, the database is
/// unreachable, or every selected channel failed.
pub(crate) async fn run_backfill(
    config: &AppConfig,
    channel_filter: Option<&str>,
    limit: usize,
    dry_run: bool,
) -> anyhow::Result<()> {
    let channels_file = ytmon_core::load_channels(&config.channels_path)?;
    let channels = select_channels(&channels_file, channel_filter)?;
    if channels.is_empty() {
        println!("no channels configured; nothing to backfill");
        return Ok(());
    }

    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn VideoStore> = if dry_run {
        memory.clone()
    } else {
        Arc::new(crate::connect_store(config).await?)
    };

    let ingestor = BackfillIngestor::new(
        Arc::new(YtDlpExtractor::from_app_config(config)),
        store,
        config.max_concurrent_channels,
    );
    let outcomes = ingestor.ingest_channels(&channels, limit).await;

    let mut failed = 0usize;
    for outcome in &outcomes {
        match outcome {
            ChannelOutcome::Completed(report) => println!(
                "{}: listed {}, upserted {}, rejected {}, duplicates {}, failed {}",
                report.channel_url,
                report.listed,
                report.upserted,
                report.rejected,
                report.duplicates,
                report.failed
            ),
            ChannelOutcome::Failed { channel_url, error } => {
                failed += 1;
                println!("{channel_url}: failed: {error}");
            }
        }
    }

    if dry_run {
        println!(
            "dry-run: {} video(s) would be written; database untouched",
            memory.len().await
        );
    }

    if failed == outcomes.len() {
        anyhow::bail!("all {failed} channel(s) failed backfill");
    }
    Ok(())
}
