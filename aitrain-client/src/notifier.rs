//! Chat notifications for job state changes
//!
//! Notifications are best-effort: the poller logs a failed delivery and keeps
//! going.

use aitrain_core::domain::job::JobState;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Default chat bot API endpoint
pub const DEFAULT_NOTIFY_ENDPOINT: &str = "https://api.telegram.org";

/// Receives job state changes
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one state-change message
    async fn notify(&self, job_id: &str, state: &JobState) -> Result<()>;
}

/// Notification settings
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Whether notifications are sent at all
    pub enabled: bool,

    /// Bot API base URL
    pub endpoint: String,

    /// Bot token
    pub token: String,

    /// Chat that receives the messages
    pub chat_id: String,
}

impl NotifierConfig {
    /// Creates an enabled configuration for the default endpoint
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_NOTIFY_ENDPOINT.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Validates the configuration
    ///
    /// A disabled configuration is always valid.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.token.is_empty() {
            return Err(ClientError::InvalidConfig(
                "notifier token cannot be empty".to_string(),
            ));
        }

        if self.chat_id.is_empty() {
            return Err(ClientError::InvalidConfig(
                "notifier chat_id cannot be empty".to_string(),
            ));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ClientError::InvalidConfig(
                "notifier endpoint must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_NOTIFY_ENDPOINT.to_string(),
            token: String::new(),
            chat_id: String::new(),
        }
    }
}

/// Sends messages through a chat bot HTTP API
pub struct ChatNotifier {
    url: String,
    chat_id: String,
    client: Client,
}

impl ChatNotifier {
    /// Builds a notifier, or `None` when notifications are disabled
    pub fn from_config(config: &NotifierConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        Some(Self {
            url: format!(
                "{}/bot{}/sendMessage",
                config.endpoint.trim_end_matches('/'),
                config.token
            ),
            chat_id: config.chat_id.clone(),
            client: Client::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

/// Text of a state-change message
pub fn message(job_id: &str, state: &JobState) -> String {
    format!("Job {} is now {}", job_id, state)
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify(&self, job_id: &str, state: &JobState) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message(job_id, state),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Notification {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Notified chat {} of job {} in state {}", self.chat_id, job_id, state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_builds_nothing() {
        assert!(ChatNotifier::from_config(&NotifierConfig::default()).is_none());
    }

    #[test]
    fn test_send_url_embeds_token() {
        let config = NotifierConfig::new("123:abc", "-100200").with_endpoint("http://localhost:9000/");
        let notifier = ChatNotifier::from_config(&config).unwrap();

        assert_eq!(notifier.url, "http://localhost:9000/bot123:abc/sendMessage");
        assert_eq!(notifier.chat_id, "-100200");
    }

    #[test]
    fn test_config_validation() {
        assert!(NotifierConfig::default().validate().is_ok());

        let mut config = NotifierConfig::new("token", "chat");
        assert!(config.validate().is_ok());

        config.chat_id = String::new();
        assert!(config.validate().is_err());

        config.chat_id = "chat".to_string();
        config.endpoint = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_message_names_job_and_state() {
        assert_eq!(message("abc", &JobState::Running), "Job abc is now RUNNING");
    }
}
