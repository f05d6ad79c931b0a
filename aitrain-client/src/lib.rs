//! AI Training HTTP Client
//!
//! A small, typed client for a remote AI training API: authenticate, submit a
//! containerized job, poll it until it reaches a terminal state, read its logs
//! and info, and optionally tell a chat channel about state changes.
//!
//! # Example
//!
//! ```no_run
//! use aitrain_client::{JobPoller, PollConfig, TrainingClient};
//! use aitrain_core::domain::spec::JobSpec;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TrainingClient::connect("my-token").await?;
//!
//!     let spec = JobSpec::new("ubuntu").with_command(["echo", "hello"]);
//!     let job = JobPoller::new(client, PollConfig::default()).run(&spec).await?;
//!
//!     println!("Job {} finished: {}", job.id, job.state());
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
mod identity;
mod jobs;
pub mod notifier;
pub mod poller;

// Re-export commonly used types
pub use api::JobApi;
pub use error::{Budget, ClientError, Result};
pub use jobs::JobHandle;
pub use notifier::{ChatNotifier, Notifier, NotifierConfig};
pub use poller::{JobPoller, PollConfig};

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// Regional endpoint used when no base URL is given
pub const DEFAULT_BASE_URL: &str = "https://gra.training.ai.cloud.ovh.net";

/// Authenticated handle to the training API
///
/// Bound to one base URL and one bearer token. The handle holds no job state
/// and is cheap to clone, so one value can be passed to every operation of a
/// flow. Idle connections are never kept: each request opens its own session
/// and releases it once the response body has been read.
#[derive(Clone)]
pub struct TrainingClient {
    /// Base URL of the API (e.g., "https://gra.training.ai.cloud.ovh.net")
    base_url: String,
    /// Bearer token sent with every request
    token: String,
    /// HTTP client instance
    client: Client,
}

impl TrainingClient {
    /// Connect to the default region and validate `token`
    ///
    /// # Errors
    /// [`ClientError::Auth`] if the identity probe is refused.
    pub async fn connect(token: impl Into<String>) -> Result<Self> {
        Self::connect_to(DEFAULT_BASE_URL, token).await
    }

    /// Connect to `base_url` and validate `token`
    ///
    /// # Example
    /// ```no_run
    /// # use aitrain_client::TrainingClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = TrainingClient::connect_to("https://bhs.training.ai.cloud.ovh.net", "token").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect_to(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().pool_max_idle_per_host(0).build()?;
        Self::connect_with_client(base_url, token, client).await
    }

    /// Connect with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub async fn connect_with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let this = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        };

        let me = this.me().await?;
        debug!("Authenticated against {} as {}", this.base_url, me.user);

        Ok(this)
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL under the base URL from path segments
    ///
    /// Each segment is percent-encoded on its own, so a `/`, `?` or `#` inside
    /// it stays part of that segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidConfig(format!("invalid base URL {}: {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfig(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// URL of one job, optionally followed by an action segment
    ///
    /// Empty ids and dot segments are refused: they would otherwise address
    /// a different resource once the path is normalized.
    fn job_endpoint(&self, id: &str, action: Option<&str>) -> Result<Url> {
        if matches!(id, "" | "." | "..") {
            return Err(ClientError::InvalidJobId(id.to_string()));
        }

        self.endpoint(["v1", "job", id].into_iter().chain(action))
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url).bearer_auth(&self.token)
    }

    fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url).bearer_auth(&self.token)
    }

    fn put(&self, url: Url) -> RequestBuilder {
        self.client.put(url).bearer_auth(&self.token)
    }

    fn delete(&self, url: Url) -> RequestBuilder {
        self.client.delete(url).bearer_auth(&self.token)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status and deserialize a JSON body
    ///
    /// A non-success status is turned into the caller's error variant via
    /// `on_error`, with the raw body attached.
    async fn handle_response<T, F>(response: reqwest::Response, on_error: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce(u16, String) -> ClientError,
    {
        let body = Self::handle_text_response(response, on_error).await?;

        serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status and return the body as text
    async fn handle_text_response<F>(response: reqwest::Response, on_error: F) -> Result<String>
    where
        F: FnOnce(u16, String) -> ClientError,
    {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(on_error(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }
}

impl fmt::Debug for TrainingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}
