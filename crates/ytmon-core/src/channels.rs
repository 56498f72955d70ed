use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::video::is_plausible_channel_id;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    /// Channel landing URL, e.g. `"https://www.youtube.com/@markets"`.
    pub url: String,
    /// Stable `UC…` id. Required for hub subscription, optional for backfill.
    #[serde(default)]
    pub channel_id: Option<String>,
}

impl ChannelConfig {
    /// Hub topic URL for this channel's upload feed, if the id is known.
    #[must_use]
    pub fn topic_url(&self) -> Option<String> {
        self.channel_id
            .as_deref()
            .map(|id| format!("https://www.youtube.com/xml/feeds/videos.xml?channel_id={id}"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsFile {
    pub channels: Vec<ChannelConfig>,
}

impl ChannelsFile {
    /// Restrict to a single channel matched by URL, ignoring a trailing slash.
    #[must_use]
    pub fn only(&self, url: &str) -> Vec<ChannelConfig> {
        let wanted = url.trim_end_matches('/');
        self.channels
            .iter()
            .filter(|c| c.url.trim_end_matches('/') == wanted)
            .cloned()
            .collect()
    }
}

/// Load and validate the monitored channel list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_channels(path: &Path) -> Result<ChannelsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ChannelsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let channels_file: ChannelsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ChannelsFileParse)?;

    validate_channels(&channels_file)?;

    Ok(channels_file)
}

fn validate_channels(channels_file: &ChannelsFile) -> Result<(), ConfigError> {
    let mut seen_urls = HashSet::new();
    let mut seen_ids = HashSet::new();

    for channel in &channels_file.channels {
        if channel.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "channel name must be non-empty".to_string(),
            ));
        }

        let url = channel.url.trim().trim_end_matches('/').to_lowercase();
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(ConfigError::Validation(format!(
                "channel '{}' has invalid url '{}'",
                channel.name, channel.url
            )));
        }

        if !seen_urls.insert(url) {
            return Err(ConfigError::Validation(format!(
                "duplicate channel url: '{}'",
                channel.url
            )));
        }

        if let Some(id) = &channel.channel_id {
            if !is_plausible_channel_id(id) {
                return Err(ConfigError::Validation(format!(
                    "channel '{}' has invalid channel_id '{id}'",
                    channel.name
                )));
            }
            if !seen_ids.insert(id.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate channel_id: '{id}'"
                )));
            }
        }
    }

    Ok(())
}
