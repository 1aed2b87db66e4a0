//! In-memory upstream for unit tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::http::{HttpError, Transport};

enum Route {
    Body(Vec<u8>),
    /// Writes a few bytes and then drops the connection
    Reset,
}

/// Serves registered URLs from memory; anything else is a 404.
#[derive(Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<String, Route>>,
    downloads: Mutex<Vec<String>>,
    fetches: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Body(body.into()));
    }

    pub fn reset_connection(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Reset);
    }

    /// URLs passed to `download_to`, in call order
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        match self.routes.lock().unwrap().get(url) {
            Some(Route::Body(body)) => Ok(body.clone()),
            Some(Route::Reset) => Err(HttpError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
            None => Err(HttpError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.lookup(url)
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, HttpError> {
        self.downloads.lock().unwrap().push(url.to_string());

        let is_reset = matches!(self.routes.lock().unwrap().get(url), Some(Route::Reset));
        if is_reset {
            tokio::fs::write(dest, b"partial").await?;
        }

        let body = self.lookup(url)?;
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}

pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}
