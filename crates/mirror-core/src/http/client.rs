//! HTTP client used to talk to the upstream build and hub servers.
//!
//! This is a thin wrapper around `reqwest` adding:
//! - Optional retry with exponential backoff on 5xx and 429 responses
//! - Streaming downloads straight to disk
//! - A fixed User-Agent and timeouts
//!
//! # Examples
//!
//! ```no_run
//! use mirror_core::http::{HttpClient, HttpClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::new()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_max_retries(2);
//!
//! let client = HttpClient::with_config(config)?;
//! let manifest = client.get_bytes("https://central.spacestation14.io/builds/robust/manifest.json").await?;
//! client.download("https://example.com/build.zip", "/tmp/build.zip".as_ref()).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::Transport;

const DEFAULT_USER_AGENT: &str = concat!("build-mirror/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct HttpClient {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(&config.user_agent);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Perform GET request, retrying server errors up to `max_retries` times
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let mut attempt = 0;

        loop {
            let error = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let error = HttpError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    // 4xx other than 429 will not get better by asking again
                    if !status.is_server_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        return Err(error);
                    }
                    error
                }
                Err(e) => HttpError::Request(e),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }

            let delay = backoff_delay(self.retry_delay, attempt);
            log::debug!("Retrying {} in {:?} ({})", url, delay, error);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Download a whole response body into memory
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        log::debug!("HTTP GET {}", url);
        let response = self.get(url).await?;
        let bytes = response.bytes().await?;
        log::debug!("HTTP 200 {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }

    /// Stream a response body into `dest`, truncating whatever was there.
    /// Returns the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, HttpError> {
        let response = self.get(url).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(dest).await?;
        let mut downloaded: u64 = 0;

        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await?;

        Ok(downloaded)
    }
}

/// Delay before retry number `attempt + 1`: 1s, 2s, 4s, ... capped at a minute
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

#[async_trait]
impl Transport for HttpClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.get_bytes(url).await
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, HttpError> {
        self.download(url, dest).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}
