pub mod backfill;
pub mod error;
pub mod extractor;
pub mod feed;
pub mod fetcher;
pub mod hub;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use backfill::{listing_url, BackfillIngestor, BackfillReport, ChannelOutcome};
pub use error::{HubError, IngestError, NotificationError};
pub use extractor::{Extractor, RawVideoInfo, YtDlpExtractor};
pub use feed::{parse_notification, FeedEntry};
pub use fetcher::{watch_url, MetadataFetcher};
pub use hub::{HubClient, SubscriptionOutcome, SubscriptionStatus};
pub use pipeline::{NotificationPipeline, NotificationReport};
