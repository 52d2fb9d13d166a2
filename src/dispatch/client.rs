//! Webhook client for the external job trigger

use reqwest::StatusCode;

use crate::config::WatcherConfig;

/// Fires notifications at the configured webhook
#[derive(Debug, Clone)]
pub struct DispatchClient {
    client: reqwest::Client,
    url: String,
}

impl DispatchClient {
    /// Build the HTTP client from config
    pub fn new(config: &WatcherConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.dispatch_timeout)
            .danger_accept_invalid_certs(config.dispatch_insecure)
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.webhook_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one notification for an alert.
    ///
    /// The request carries no body; the receiving job finds the alert through
    /// its marker. Any HTTP response counts as delivered, the status is only
    /// logged.
    pub async fn notify(&self, alert_id: i64) -> Result<StatusCode, DispatchError> {
        let response = self
            .client
            .post(&self.url)
            .send()
            .await
            .map_err(|e| DispatchError::Request {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(alert_id, url = %self.url, status = %status, "Triggered webhook");
        } else {
            tracing::warn!(
                alert_id,
                url = %self.url,
                status = %status,
                "Webhook answered with non-success status"
            );
        }

        Ok(status)
    }
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to trigger webhook {url}: {message}")]
    Request { url: String, message: String },
}
