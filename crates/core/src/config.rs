use std::time::Duration;

use url::Url;

use crate::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retries.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2).min(16);
        self.backoff.saturating_mul(1u32 << exponent)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applied to the JSON endpoints.
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    /// Only search and table-of-contents lookups are retried.
    pub retry: RetryPolicy,
    pub socket_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
            socket_path: "/socket.io/".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        Url::parse(base_url)?;
        Ok(Self {
            base_url: base_url.to_string(),
            ..Self::default()
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Ok(Url::parse(&base)?.join(path.trim_start_matches('/'))?)
    }

    /// WebSocket URL of the Socket.IO endpoint on the same host.
    pub fn socket_url(&self) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&self.socket_path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Channel(format!("cannot derive websocket url from {url}")))?;
        url.set_query(Some("EIO=4&transport=websocket"));
        Ok(url)
    }
}
