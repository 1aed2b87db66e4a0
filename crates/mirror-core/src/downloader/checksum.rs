//! SHA-256 content verification for mirrored artifacts.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::Result;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the lowercase hex SHA-256 of a file, reading it in chunks
pub async fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare two hex digests, ignoring case
pub fn digests_match(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}

/// Verify the SHA-256 of a file against an expected hex digest
pub async fn verify_checksum(path: &Path, expected: &str) -> Result<bool> {
    let actual = compute_sha256(path).await?;
    Ok(digests_match(&actual, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MirrorError;
    use tempfile::TempDir;

    // SHA-256 of "hello world"
    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[tokio::test]
    async fn test_compute_sha256() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.bin");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let hash = compute_sha256(&path).await.unwrap();
        assert_eq!(hash, HELLO_WORLD);
    }

    #[tokio::test]
    async fn test_compute_sha256_larger_than_buffer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.bin");
        let content = vec![0xabu8; READ_BUFFER_SIZE * 3 + 17];
        tokio::fs::write(&path, &content).await.unwrap();

        let expected = format!("{:x}", Sha256::digest(&content));
        assert_eq!(compute_sha256(&path).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_verify_checksum_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.bin");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        assert!(verify_checksum(&path, HELLO_WORLD).await.unwrap());
        assert!(verify_checksum(&path, &HELLO_WORLD.to_uppercase()).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_checksum_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.bin");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let wrong_hash = "0000000000000000000000000000000000000000000000000000000000000000";
        assert!(!verify_checksum(&path, wrong_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = compute_sha256(&temp_dir.path().join("missing")).await;
        assert!(matches!(result, Err(MirrorError::Io(_))));
    }

    #[test]
    fn test_digests_match() {
        assert!(digests_match("abcdef", "ABCDEF"));
        assert!(digests_match("abcdef", " abcdef\n"));
        assert!(!digests_match("abcdef", "abcdee"));
        assert!(!digests_match("abcdef", ""));
    }
}
