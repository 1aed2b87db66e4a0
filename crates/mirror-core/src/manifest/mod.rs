//! Build manifest model and sync engine.

mod model;
mod sync;

pub use model::{ManifestDocument, PlatformEntry, VersionEntry};
pub use sync::{is_version_too_old, rewrite_url, ManifestSyncEngine, ManifestSyncOutcome};
