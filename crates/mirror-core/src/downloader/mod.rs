//! Artifact downloading and verification.
//!
//! Artifacts are content-addressed by their SHA-256: a file is either
//! already correct on disk or fetched again in full.

mod checksum;
mod fetcher;

pub use checksum::{compute_sha256, digests_match, verify_checksum};
pub use fetcher::{ArtifactFetcher, FetchStatus};
