//! Frame fetching: the transport seam between the scheduler and the
//! outside world.
//!
//! The scheduler only sees [`FrameFetcher`]; production uses the
//! reqwest-backed [`HttpFetcher`] with a per-request timeout, tests plug in
//! whatever they like.

use std::time::Duration;

use async_trait::async_trait;

/// Default per-request timeout. A camera endpoint slower than this is
/// treated as failed and retried when next due.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors surfaced by a frame fetch. All of them leave the camera's cached
/// state untouched; the scheduler logs and moves on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Unexpected status {status} fetching {url}")]
    Status { url: String, status: u16 },
}

/// Fetch raw image bytes from a camera endpoint.
#[async_trait]
pub trait FrameFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// HTTP(S) fetcher backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests abort after `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("camwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn map_error(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl FrameFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(url, e))?;
        tracing::trace!(url = %url, bytes = bytes.len(), "Fetched frame");
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
