//! Verified artifact fetching.

use std::path::Path;
use std::sync::Arc;

use crate::http::Transport;
use crate::Result;

use super::checksum::verify_checksum;

/// Result of [`ArtifactFetcher::ensure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A matching file was already on disk; nothing was transferred
    AlreadyPresent,
    /// The file was downloaded and matched the expected digest
    Downloaded,
    /// The downloaded file did not match and has been removed
    Mismatch,
}

impl FetchStatus {
    /// Whether a verified file is now present at the destination
    pub fn is_present(self) -> bool {
        matches!(self, FetchStatus::AlreadyPresent | FetchStatus::Downloaded)
    }
}

/// Makes sure a local file exists and matches an expected SHA-256.
pub struct ArtifactFetcher {
    transport: Arc<dyn Transport>,
}

impl ArtifactFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Ensure `dest` holds the content of `url` with digest `expected_sha256`.
    ///
    /// An existing matching file short-circuits without any network access.
    /// Otherwise the file is downloaded over whatever is at `dest` and
    /// checked again; a mismatching download is deleted. Transport errors
    /// are returned after removing any partially written file.
    pub async fn ensure(&self, url: &str, expected_sha256: &str, dest: &Path) -> Result<FetchStatus> {
        if dest.is_file() && verify_checksum(dest, expected_sha256).await? {
            log::info!("File already ok: {}", dest.display());
            return Ok(FetchStatus::AlreadyPresent);
        }

        log::debug!("Downloading file: {}", url);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = self.transport.download_to(url, dest).await {
            remove_if_exists(dest).await;
            return Err(e.into());
        }

        if dest.is_file() {
            if verify_checksum(dest, expected_sha256).await? {
                log::info!("File downloaded + verified ok: {}", dest.display());
                return Ok(FetchStatus::Downloaded);
            }

            remove_if_exists(dest).await;
        }

        log::warn!("File download / verification failure: {}", dest.display());
        Ok(FetchStatus::Mismatch)
    }
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sha256_hex, MemoryTransport};
    use crate::MirrorError;
    use tempfile::TempDir;

    const URL: &str = "https://upstream/builds/robust/builds/132.1.0/linux-x64.zip";

    fn fetcher_serving(body: &[u8]) -> (Arc<MemoryTransport>, ArtifactFetcher) {
        let transport = Arc::new(MemoryTransport::new());
        transport.serve(URL, body);
        let fetcher = ArtifactFetcher::new(transport.clone());
        (transport, fetcher)
    }

    #[tokio::test]
    async fn test_downloads_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("132.1.0").join("linux-x64.zip");
        let (transport, fetcher) = fetcher_serving(b"hello world");

        let status = fetcher.ensure(URL, &sha256_hex(b"hello world"), &dest).await.unwrap();

        assert_eq!(status, FetchStatus::Downloaded);
        assert!(status.is_present());
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
        assert_eq!(transport.downloads(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn test_existing_matching_file_skips_network() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("linux-x64.zip");
        std::fs::write(&dest, b"hello world").unwrap();
        let (transport, fetcher) = fetcher_serving(b"something else");

        let expected = sha256_hex(b"hello world").to_uppercase();
        let status = fetcher.ensure(URL, &expected, &dest).await.unwrap();

        assert_eq!(status, FetchStatus::AlreadyPresent);
        assert!(transport.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_stale_file_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("linux-x64.zip");
        std::fs::write(&dest, b"corrupt leftovers from a crashed run").unwrap();
        let (_transport, fetcher) = fetcher_serving(b"hello world");

        let status = fetcher.ensure(URL, &sha256_hex(b"hello world"), &dest).await.unwrap();

        assert_eq!(status, FetchStatus::Downloaded);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_mismatching_download_is_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("linux-x64.zip");
        let (transport, fetcher) = fetcher_serving(b"tampered");
        let expected = sha256_hex(b"hello world");

        let status = fetcher.ensure(URL, &expected, &dest).await.unwrap();
        assert_eq!(status, FetchStatus::Mismatch);
        assert!(!status.is_present());
        assert!(!dest.exists());

        // The next attempt starts from nothing and downloads again
        let status = fetcher.ensure(URL, &expected, &dest).await.unwrap();
        assert_eq!(status, FetchStatus::Mismatch);
        assert_eq!(transport.downloads().len(), 2);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_transport_error_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("linux-x64.zip");
        let transport = Arc::new(MemoryTransport::new());
        transport.reset_connection(URL);
        let fetcher = ArtifactFetcher::new(transport.clone());

        let result = fetcher.ensure(URL, &sha256_hex(b"hello world"), &dest).await;

        assert!(matches!(result, Err(MirrorError::Http(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_not_found_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("linux-x64.zip");
        let fetcher = ArtifactFetcher::new(Arc::new(MemoryTransport::new()));

        let result = fetcher.ensure(URL, &sha256_hex(b"x"), &dest).await;

        assert!(matches!(result, Err(MirrorError::Http(_))));
        assert!(!dest.exists());
    }
}
