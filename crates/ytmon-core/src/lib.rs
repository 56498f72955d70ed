pub mod app_config;
pub mod channels;
pub mod config;
pub mod memory;
pub mod query;
pub mod store;
pub mod video;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use channels::{load_channels, ChannelConfig, ChannelsFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use memory::MemoryStore;
pub use query::{ChannelStats, RecentCount};
pub use store::{StoreError, VideoFilter, VideoStore};
pub use video::{
    is_plausible_channel_id, is_plausible_video_id, parse_upload_date, VideoRecord, VideoView,
    VIDEO_ID_LEN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read channels file {path}: {source}")]
    ChannelsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse channels file: {0}")]
    ChannelsFileParse(#[from] serde_yaml::Error),

    #[error("invalid channels configuration: {0}")]
    Validation(String),
}
