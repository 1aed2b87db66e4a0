//! Upstream transport.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpError};

use async_trait::async_trait;
use std::path::Path;

/// How the sync engines reach upstream. Implemented by [`HttpClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a whole resource into memory
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError>;

    /// Fetch a resource into `dest`, creating parent directories and
    /// overwriting existing content. Returns the number of bytes written.
    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, HttpError>;
}
