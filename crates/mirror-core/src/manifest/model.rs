//! Build manifest document.
//!
//! ```json
//! {
//!   "132.1.0": {
//!     "insecure": false,
//!     "platforms": {
//!       "linux-x64": { "sig": "...", "sha256": "...", "url": "https://.../132.1.0/linux-x64.zip" }
//!     }
//!   }
//! }
//! ```
//!
//! Key order and fields this crate does not know about are preserved, so a
//! published manifest differs from upstream only in rewritten `url` values.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// Ordered map of version identifier to entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestDocument {
    pub versions: IndexMap<String, VersionEntry>,
}

/// A single build version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Carried through unchanged; not consulted when mirroring
    pub insecure: bool,

    /// `None` when the key is absent, `Some(None)` when upstream sent `null`
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub platforms: Option<Option<IndexMap<String, PlatformEntry>>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionEntry {
    /// Platforms to mirror, if upstream listed any
    pub fn platforms_mut(&mut self) -> Option<&mut IndexMap<String, PlatformEntry>> {
        self.platforms.as_mut().and_then(Option::as_mut)
    }
}

// Only called when the key is present, so `null` becomes `Some(None)`
fn deserialize_present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Artifact metadata for one version/platform combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub sig: String,
    pub sha256: String,
    pub url: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total number of platform entries across all versions
    pub fn platform_count(&self) -> usize {
        self.versions
            .values()
            .filter_map(|v| v.platforms.as_ref().and_then(Option::as_ref))
            .map(|p| p.len())
            .sum()
    }
}
