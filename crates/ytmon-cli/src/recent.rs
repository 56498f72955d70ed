use ytmon_core::{query, VideoStore, VideoView};

const TITLE_WIDTH: usize = 60;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width).collect::<String>())
    } else {
        text.to_string()
    }
}

pub(crate) fn format_row(video: &VideoView) -> String {
    let published = video.published_at.get(..10).unwrap_or(&video.published_at);
    format!(
        "{:<12}{:<13}{:<24}{}",
        published,
        video.video_id,
        truncate(video.channel_name.as_deref().unwrap_or("-"), 22),
        truncate(video.title.as_deref().unwrap_or(""), TITLE_WIDTH)
    )
}

/// Print the `limit` most recently published videos as a table.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub(crate) async fn run_recent(store: &dyn VideoStore, limit: i64) -> anyhow::Result<()> {
    let videos = query::recent_videos(store, limit.max(1)).await?;

    if videos.is_empty() {
        println!("no videos stored yet; run `backfill` first");
        return Ok(());
    }

    println!(
        "{:<12}{:<13}{:<24}TITLE",
        "PUBLISHED", "VIDEO ID", "CHANNEL"
    );
    for video in &videos {
        println!("{}", format_row(video));
    }
    Ok(())
}
