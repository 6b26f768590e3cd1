// src/notify.rs - Plot completion webhook
use thiserror::Error;

use crate::config::NotifyConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Posts a plain-text message to the configured webhook, if any.
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    client: reqwest::Client,
    webhook: Option<String>,
}

impl CompletionNotifier {
    pub fn from_config(config: &NotifyConfig) -> Self {
        let client = match reqwest::Client::builder().timeout(config.timeout()).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Falling back to default webhook client: {}", e);
                reqwest::Client::new()
            }
        };
        Self {
            client,
            webhook: config.webhook.clone(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook: None,
        }
    }

    pub fn webhook(&self) -> Option<&str> {
        self.webhook.as_deref()
    }

    /// POST `message` as the request body. Does nothing without a webhook.
    pub async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let Some(url) = self.webhook.as_deref() else {
            return Ok(());
        };
        tracing::info!("Notifying {}: {}", url, message);
        self.client
            .post(url)
            .body(message.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
