//! Build manifest mirroring.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{BuildMirrorConfig, FailurePolicy};
use crate::downloader::ArtifactFetcher;
use crate::http::Transport;
use crate::publish::write_atomic;
use crate::validate::{file_name_from_url, is_unsafe_file_name, is_unsafe_name};
use crate::Result;

use super::model::{ManifestDocument, PlatformEntry};

/// How a manifest sync run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSyncOutcome {
    /// The rewritten manifest was written out
    Published { files: usize },
    /// Too few files were mirrored; the previous manifest was kept
    BelowThreshold { files: usize },
    /// An artifact failed verification; nothing was published
    Aborted {
        version: String,
        platform: String,
        files: usize,
    },
}

impl ManifestSyncOutcome {
    pub fn files(&self) -> usize {
        match self {
            ManifestSyncOutcome::Published { files }
            | ManifestSyncOutcome::BelowThreshold { files }
            | ManifestSyncOutcome::Aborted { files, .. } => *files,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ManifestSyncOutcome::Published { .. })
    }
}

enum Mirror {
    Done,
    Skipped,
    Failed,
}

enum Pass {
    Completed { files: usize },
    Aborted { version: String, platform: String, files: usize },
}

/// Mirrors the upstream build manifest and the artifacts it references.
pub struct ManifestSyncEngine {
    config: BuildMirrorConfig,
    transport: Arc<dyn Transport>,
    fetcher: ArtifactFetcher,
}

impl ManifestSyncEngine {
    pub fn new(config: BuildMirrorConfig, transport: Arc<dyn Transport>) -> Self {
        let fetcher = ArtifactFetcher::new(Arc::clone(&transport));
        Self {
            config,
            transport,
            fetcher,
        }
    }

    pub fn config(&self) -> &BuildMirrorConfig {
        &self.config
    }

    /// Run one sync pass.
    ///
    /// Fetches and parses the upstream manifest, makes sure every eligible
    /// artifact is on disk and verified, rewrites the URLs of mirrored
    /// entries and publishes the manifest if at least
    /// `minimum_files` artifacts were mirrored.
    pub async fn sync(&self) -> Result<ManifestSyncOutcome> {
        log::debug!("Fetching manifest {}", self.config.manifest_url);
        let bytes = self.transport.fetch_bytes(&self.config.manifest_url).await?;
        let mut manifest = ManifestDocument::from_slice(&bytes)?;

        let files = match self.mirror_artifacts(&mut manifest).await? {
            Pass::Completed { files } => files,
            Pass::Aborted {
                version,
                platform,
                files,
            } => {
                log::error!("Bailing out early due to download problem.");
                return Ok(ManifestSyncOutcome::Aborted {
                    version,
                    platform,
                    files,
                });
            }
        };

        log::info!("Processed {} files.", files);

        if files < self.config.minimum_files {
            log::warn!(
                "Not enough files ({} < {}), keeping previous manifest.",
                files,
                self.config.minimum_files
            );
            return Ok(ManifestSyncOutcome::BelowThreshold { files });
        }

        let json = manifest.to_pretty_json()?;
        write_atomic(&self.config.manifest_path, json.as_bytes())?;
        log::info!("Wrote out manifest: {}", self.config.manifest_path.display());

        Ok(ManifestSyncOutcome::Published { files })
    }

    async fn mirror_artifacts(&self, manifest: &mut ManifestDocument) -> Result<Pass> {
        let mut files = 0;

        for (version, entry) in manifest.versions.iter_mut() {
            if is_unsafe_name(version) {
                log::warn!("Skipping version because invalid characters: {}", version);
                continue;
            }

            if is_version_too_old(version, self.config.minimum_version) {
                log::info!("Skipping old version: {}", version);
                continue;
            }

            let Some(platforms) = entry.platforms_mut() else {
                continue;
            };

            for (platform, artifact) in platforms.iter_mut() {
                if is_unsafe_name(platform) {
                    log::warn!("Skipping platform because invalid characters: {}", platform);
                    continue;
                }

                match self.mirror_artifact(version, artifact).await? {
                    Mirror::Done => files += 1,
                    Mirror::Skipped => {}
                    Mirror::Failed => match self.config.on_failure {
                        FailurePolicy::Abort => {
                            return Ok(Pass::Aborted {
                                version: version.clone(),
                                platform: platform.clone(),
                                files,
                            });
                        }
                        FailurePolicy::Skip => {
                            log::warn!("Leaving {} {} pointing upstream", version, platform);
                        }
                    },
                }
            }
        }

        Ok(Pass::Completed { files })
    }

    /// Fetch one artifact and point its entry at the mirror.
    async fn mirror_artifact(&self, version: &str, artifact: &mut PlatformEntry) -> Result<Mirror> {
        let file_name = match file_name_from_url(&artifact.url) {
            Some(name) if !is_unsafe_file_name(&name) => name,
            _ => {
                log::warn!(
                    "Skipping download because invalid file name characters: {}",
                    artifact.url
                );
                return Ok(Mirror::Skipped);
            }
        };

        let dest = self.artifact_path(version, &file_name);

        let status = match self.fetcher.ensure(&artifact.url, &artifact.sha256, &dest).await {
            Ok(status) => status,
            Err(e) if self.config.on_failure == FailurePolicy::Skip => {
                log::warn!("Download of {} failed: {}", artifact.url, e);
                return Ok(Mirror::Failed);
            }
            Err(e) => return Err(e),
        };

        if !status.is_present() {
            return Ok(Mirror::Failed);
        }

        artifact.url = rewrite_url(
            &artifact.url,
            &self.config.upstream_base_url,
            &self.config.mirror_base_url,
            version,
            &file_name,
        );
        Ok(Mirror::Done)
    }

    /// Local path of an artifact: `<storage root>/<version>/<file name>`
    pub fn artifact_path(&self, version: &str, file_name: &str) -> PathBuf {
        self.config.storage_root.join(version).join(file_name)
    }
}

/// Whether `version` falls below the version floor.
///
/// The leading number (up to the first `.`) is compared against `minimum`.
/// Versions without a `.` or with a non-numeric leading part count as too
/// old. A `minimum` of zero or less accepts every version.
pub fn is_version_too_old(version: &str, minimum: i64) -> bool {
    if minimum <= 0 {
        return false;
    }

    match version.split_once('.') {
        Some((major, _)) => match major.parse::<i64>() {
            Ok(major) => major < minimum,
            Err(_) => true,
        },
        None => true,
    }
}

/// Point a mirrored artifact URL at the mirror.
///
/// The upstream base prefix is swapped for the mirror base. URLs that do
/// not start with the upstream base are rebuilt from the mirror base and
/// the storage layout, so a mirrored entry always points at the mirror.
pub fn rewrite_url(
    url: &str,
    upstream_base: &str,
    mirror_base: &str,
    version: &str,
    file_name: &str,
) -> String {
    if let Some(rest) = url.strip_prefix(upstream_base) {
        return format!("{}{}", mirror_base, rest);
    }

    log::debug!("{} is not under {}, using storage layout", url, upstream_base);
    format!("{}/{}/{}", mirror_base.trim_end_matches('/'), version, file_name)
}
