use ytmon_core::AppConfig;
use ytmon_ingest::{HubClient, SubscriptionStatus};

/// Request hub subscriptions for every configured channel and print the
/// per-channel outcome.
///
/// # Errors
///
/// Returns an error if the channels file cannot be loaded or the HTTP
/// client cannot be built. Per-channel failures are printed, not returned.
pub(crate) async fn run_subscribe(config: &AppConfig, callback_url: &str) -> anyhow::Result<()> {
    let channels = ytmon_core::load_channels(&config.channels_path)?;
    let hub = HubClient::from_app_config(config)?;

    for outcome in hub.subscribe_all(&channels, callback_url).await {
        match outcome.status {
            SubscriptionStatus::Requested { code } => {
                println!("{}: subscription requested ({code})", outcome.channel);
            }
            SubscriptionStatus::Failed { code, error } => {
                println!("{}: failed ({code}): {error}", outcome.channel);
            }
            SubscriptionStatus::Error { detail } => {
                println!("{}: error: {detail}", outcome.channel);
            }
        }
    }
    Ok(())
}
