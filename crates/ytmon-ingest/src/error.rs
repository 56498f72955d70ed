use thiserror::Error;
use ytmon_core::StoreError;

/// Per-item failures on either ingestion path. None of these abort a batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid video id {0:?}")]
    InvalidVideoId(String),

    #[error("failed to launch extractor {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor timed out after {secs}s for {url}")]
    Timeout { url: String, secs: u64 },

    #[error("extractor exited with {status} for {url}: {stderr}")]
    ExtractorFailed {
        url: String,
        status: String,
        stderr: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The notification body as a whole could not be understood.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("notification body is not valid UTF-8")]
    Encoding,

    #[error("notification body is not an Atom feed")]
    NotAFeed,
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel {channel} has no channel_id configured")]
    MissingChannelId { channel: String },
}
