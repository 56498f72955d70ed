//! `WebSub` hub subscription client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use ytmon_core::{ChannelConfig, ChannelsFile};

use crate::error::HubError;

/// Result of one channel's subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// The hub accepted the request (202, or 204 for sync verification).
    #[serde(rename = "subscription_requested")]
    Requested { code: u16 },
    /// The hub answered with any other status.
    Failed { code: u16, error: String },
    /// The request never got an answer, or could not be made at all.
    Error { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionOutcome {
    pub channel: String,
    #[serde(flatten)]
    pub status: SubscriptionStatus,
}

impl SubscriptionOutcome {
    #[must_use]
    pub fn is_requested(&self) -> bool {
        matches!(self.status, SubscriptionStatus::Requested { .. })
    }
}

#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    hub_url: String,
    secret: Option<String>,
    lease_seconds: Option<u64>,
}

impl HubClient {
    /// # Errors
    ///
    /// Returns [`HubError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(hub_url: impl Into<String>, timeout_secs: u64) -> Result<Self, HubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(concat!("ytmon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            hub_url: hub_url.into(),
            secret: None,
            lease_seconds: None,
        })
    }

    /// # Errors
    ///
    /// See [`HubClient::new`].
    pub fn from_app_config(config: &ytmon_core::AppConfig) -> Result<Self, HubError> {
        let mut hub = Self::new(config.hub_url.clone(), config.hub_timeout_secs)?;
        hub.secret.clone_from(&config.hub_secret);
        hub.lease_seconds = config.hub_lease_seconds;
        Ok(hub)
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_lease_seconds(mut self, lease_seconds: u64) -> Self {
        self.lease_seconds = Some(lease_seconds);
        self
    }

    fn form(&self, topic: &str, callback_url: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("hub.mode", "subscribe".to_string()),
            ("hub.topic", topic.to_string()),
            ("hub.callback", callback_url.to_string()),
            ("hub.verify", "async".to_string()),
        ];
        if let Some(secret) = &self.secret {
            form.push(("hub.secret", secret.clone()));
        }
        if let Some(lease) = self.lease_seconds {
            form.push(("hub.lease_seconds", lease.to_string()));
        }
        form
    }

    /// Request a subscription for one channel's upload feed.
    ///
    /// # Errors
    ///
    /// - [`HubError::MissingChannelId`] if the channel has no id.
    /// - [`HubError::Http`] on transport failure or timeout.
    ///
    /// A non-success answer from the hub is not an error; it comes back as
    /// [`SubscriptionStatus::Failed`].
    pub async fn subscribe_channel(
        &self,
        channel: &ChannelConfig,
        callback_url: &str,
    ) -> Result<SubscriptionStatus, HubError> {
        let topic = channel
            .topic_url()
            .ok_or_else(|| HubError::MissingChannelId {
                channel: channel.name.clone(),
            })?;

        let response = self
            .client
            .post(&self.hub_url)
            .form(&self.form(&topic, callback_url))
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT {
            return Ok(SubscriptionStatus::Requested {
                code: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Ok(SubscriptionStatus::Failed {
            code: status.as_u16(),
            error: body,
        })
    }

    /// Subscribe every configured channel, one after another. Each channel
    /// gets an outcome; a failure never stops the rest.
    pub async fn subscribe_all(
        &self,
        channels: &ChannelsFile,
        callback_url: &str,
    ) -> Vec<SubscriptionOutcome> {
        let mut results = Vec::with_capacity(channels.channels.len());
        for channel in &channels.channels {
            let status = match self.subscribe_channel(channel, callback_url).await {
                Ok(status) => status,
                Err(e) => SubscriptionStatus::Error {
                    detail: e.to_string(),
                },
            };
            match &status {
                SubscriptionStatus::Requested { code } => {
                    tracing::info!(channel = %channel.url, code, "subscription requested");
                }
                SubscriptionStatus::Failed { code, error } => {
                    tracing::warn!(
                        channel = %channel.url,
                        code,
                        error = %error,
                        "hub rejected subscription"
                    );
                }
                SubscriptionStatus::Error { detail } => {
                    tracing::error!(
                        channel = %channel.url,
                        detail = %detail,
                        "subscription request failed"
                    );
                }
            }
            results.push(SubscriptionOutcome {
                channel: channel.url.clone(),
                status,
            });
        }
        results
    }
}
