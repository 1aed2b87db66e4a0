//! Mirror for a Robust build manifest and hub server list.
//!
//! [`ManifestSyncEngine`] fetches the upstream build manifest, downloads and
//! verifies every eligible artifact into local storage, rewrites artifact
//! URLs to the mirror and publishes the result. [`DirectorySyncEngine`]
//! does the same for the hub's server list, minus the artifacts. Both only
//! publish when a run looks healthy enough, and [`MirrorRunner`] runs them
//! back to back.

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod hub;
pub mod manifest;
pub mod publish;
pub mod runner;
pub mod validate;

#[cfg(test)]
mod testing;

pub use config::{FailurePolicy, MirrorConfig};
pub use downloader::{ArtifactFetcher, FetchStatus};
pub use error::{MirrorError, Result};
pub use http::{HttpClient, Transport};
pub use hub::{DirectorySyncEngine, HubSyncOutcome, ServerListDocument};
pub use manifest::{ManifestDocument, ManifestSyncEngine, ManifestSyncOutcome};
pub use runner::{MirrorRunner, RunSummary};
