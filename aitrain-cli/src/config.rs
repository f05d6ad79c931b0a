//! Configuration module
//!
//! Connection settings shared by every command, plus the flag groups that
//! build the client's poll and notifier configuration.

use aitrain_client::notifier::DEFAULT_NOTIFY_ENDPOINT;
use aitrain_client::poller::DEFAULT_POLL_INTERVAL;
use aitrain_client::{NotifierConfig, PollConfig, TrainingClient};
use aitrain_core::domain::spec::{Volume, VolumePermission};
use anyhow::{Context, Result};
use clap::Args;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the training API
    pub base_url: String,
    /// Bearer token
    pub token: String,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            anyhow::bail!("token cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        Ok(())
    }

    /// Connects and validates the token
    pub async fn connect(&self) -> Result<TrainingClient> {
        TrainingClient::connect_to(&self.base_url, &self.token)
            .await
            .context("Failed to connect to the training API")
    }
}

/// Poll loop flags
#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    /// Seconds between two status checks
    #[arg(long, env = "AITRAIN_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval: u64,

    /// Give up waiting after this many seconds
    #[arg(long, env = "AITRAIN_LOCAL_TIMEOUT")]
    pub local_timeout: Option<u64>,
}

impl PollArgs {
    pub fn to_config(&self) -> Result<PollConfig> {
        let mut config = PollConfig::default().with_interval(Duration::from_secs(self.interval));
        if let Some(secs) = self.local_timeout {
            config = config.with_local_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }
}

/// Chat notification flags
#[derive(Debug, Clone, Args)]
pub struct NotifyArgs {
    /// Send job state changes to a chat
    #[arg(long, env = "AITRAIN_NOTIFY")]
    pub notify: bool,

    /// Chat bot API base URL
    #[arg(long, env = "AITRAIN_NOTIFY_ENDPOINT", default_value = DEFAULT_NOTIFY_ENDPOINT)]
    pub notify_endpoint: String,

    /// Chat bot token
    #[arg(long, env = "AITRAIN_NOTIFY_TOKEN", hide_env_values = true, default_value = "")]
    pub notify_token: String,

    /// Chat that receives the messages
    #[arg(long, env = "AITRAIN_NOTIFY_CHAT_ID", default_value = "")]
    pub notify_chat_id: String,
}

impl NotifyArgs {
    pub fn to_config(&self) -> Result<NotifierConfig> {
        let mut config = NotifierConfig::new(&self.notify_token, &self.notify_chat_id)
            .with_endpoint(&self.notify_endpoint);
        config.enabled = self.notify;

        config.validate()?;
        Ok(config)
    }
}

/// Parses a `KEY=VALUE` pair
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;

    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }

    Ok((key.to_string(), value.to_string()))
}

/// Parses a `CONTAINER@ALIAS:MOUNT_PATH[:ro|rw|rwd][:cache]` volume
pub fn parse_volume(s: &str) -> Result<Volume, String> {
    let mut parts = s.split(':');

    let source = parts.next().unwrap_or_default();
    let (container, alias) = source
        .split_once('@')
        .filter(|(container, alias)| !container.is_empty() && !alias.is_empty())
        .ok_or_else(|| format!("expected CONTAINER@ALIAS:MOUNT_PATH, got `{}`", s))?;

    let mount_path = parts
        .next()
        .filter(|path| path.starts_with('/'))
        .ok_or_else(|| format!("missing absolute mount path in `{}`", s))?;

    let mut volume = Volume::data_store(alias, container, mount_path);
    for option in parts {
        volume = match option {
            "ro" => volume.with_permission(VolumePermission::ReadOnly),
            "rw" => volume.with_permission(VolumePermission::ReadWrite),
            "rwd" => volume.with_permission(VolumePermission::ReadWriteDelete),
            "cache" => volume.with_cache(true),
            other => return Err(format!("unknown volume option `{}` in `{}`", other, s)),
        };
    }

    Ok(volume)
}
