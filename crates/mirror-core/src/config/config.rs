use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::source::{ConfigLoader, ConfigSource};
use crate::error::{MirrorError, Result};
use crate::http::HttpClientConfig;

/// What the manifest engine does when an artifact cannot be fetched and verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and publish nothing
    Abort,
    /// Leave the entry pointing upstream and keep going
    Skip,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}

impl FailurePolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Some(FailurePolicy::Abort),
            "skip" => Some(FailurePolicy::Skip),
            _ => None,
        }
    }
}

/// Build manifest mirror settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildMirrorConfig {
    /// Local directory artifacts are stored under, as `<root>/<version>/<file>`
    pub storage_root: PathBuf,

    /// Base URL clients reach the mirrored artifacts at
    pub mirror_base_url: String,

    /// Upstream base URL replaced by `mirror_base_url` in published entries
    pub upstream_base_url: String,

    /// Where the rewritten manifest is published
    pub manifest_path: PathBuf,

    /// Upstream manifest location
    pub manifest_url: String,

    /// Versions whose leading number is below this are not mirrored. 0 pulls everything.
    pub minimum_version: i64,

    /// Minimum number of synced files before the manifest is published
    pub minimum_files: usize,

    pub on_failure: FailurePolicy,
}

impl Default for BuildMirrorConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("builds/robust/builds/"),
            mirror_base_url: "https://cdn.blepstation.com/builds/robust/builds/".to_string(),
            upstream_base_url: "https://cdn.centcomm.spacestation14.com/builds/robust/builds/"
                .to_string(),
            manifest_path: PathBuf::from("manifest/manifest.json"),
            manifest_url: "https://central.spacestation14.io/builds/robust/manifest.json"
                .to_string(),
            minimum_version: 132,
            minimum_files: 2,
            on_failure: FailurePolicy::Abort,
        }
    }
}

/// Hub server list mirror settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HubMirrorConfig {
    pub servers_path: PathBuf,
    pub servers_url: String,
    /// Minimum number of servers with an address before the list is published
    pub minimum_servers: usize,
}

impl Default for HubMirrorConfig {
    fn default() -> Self {
        Self {
            servers_path: PathBuf::from("hub/api/servers"),
            servers_url: "https://central.spacestation14.io/hub/api/servers".to_string(),
            minimum_servers: 3,
        }
    }
}

/// Transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            connect_timeout_secs: 10,
            max_retries: 0,
            retry_delay_ms: 1000,
            user_agent: concat!("build-mirror/", env!("CARGO_PKG_VERSION")).to_string(),
            proxy: None,
        }
    }
}

/// Full mirror configuration, usually loaded from `mirror.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub build: BuildMirrorConfig,
    pub hub: HubMirrorConfig,
    pub http: HttpSettings,

    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl MirrorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: MirrorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let loader = ConfigLoader::new(false);
        let config = Self::load_with(&loader, path)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from defaults, an optional file and environment overrides
    pub fn build(path: Option<&Path>, use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);

        let mut config = match path {
            Some(path) => Self::load_with(&loader, path)?,
            None => Self::default(),
        };

        if use_environment {
            config.apply_env_overrides(&loader)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn load_with(loader: &ConfigLoader, path: &Path) -> Result<Self> {
        match loader.read_file(path)? {
            Some(content) => {
                let mut config: MirrorConfig = toml::from_str(&content)?;
                let table: toml::Table = toml::from_str(&content)?;
                for (section, values) in &table {
                    if let Some(values) = values.as_table() {
                        for key in values.keys() {
                            config.sources.insert(
                                format!("{}.{}", section, key),
                                ConfigSource::File(path.to_path_buf()),
                            );
                        }
                    }
                }
                log::debug!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => {
                log::debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Where a value came from, keyed as `section.key` (e.g. `build.minimum-version`)
    pub fn get_source(&self, key: &str) -> &ConfigSource {
        self.sources.get(key).unwrap_or(&ConfigSource::Default)
    }

    /// Resolve every relative local path against `base_dir`
    pub fn with_base_dir<P: AsRef<Path>>(mut self, base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        self.build.storage_root = resolve_path(base_dir, &self.build.storage_root);
        self.build.manifest_path = resolve_path(base_dir, &self.build.manifest_path);
        self.hub.servers_path = resolve_path(base_dir, &self.hub.servers_path);
        self
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::new()
            .with_timeout(Duration::from_secs(self.http.timeout_secs))
            .with_connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))
            .with_max_retries(self.http.max_retries)
            .with_retry_delay(Duration::from_millis(self.http.retry_delay_ms))
            .with_user_agent(self.http.user_agent.clone());

        if let Some(proxy) = &self.http.proxy {
            config = config.with_proxy(proxy.clone());
        }

        config
    }

    fn validate(&self) -> Result<()> {
        if self.build.mirror_base_url.is_empty() {
            return Err(MirrorError::Config("build.mirror-base-url must not be empty".to_string()));
        }
        if self.build.upstream_base_url.is_empty() {
            return Err(MirrorError::Config("build.upstream-base-url must not be empty".to_string()));
        }
        if self.build.manifest_url.is_empty() || self.hub.servers_url.is_empty() {
            return Err(MirrorError::Config("upstream URLs must not be empty".to_string()));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, loader: &ConfigLoader) -> Result<()> {
        if let Some(root) = loader.get_env_path("STORAGE_ROOT") {
            self.build.storage_root = root;
            self.mark_env("build.storage-root", "STORAGE_ROOT");
        }

        if let Some(url) = loader.get_env("BASE_URL") {
            self.build.mirror_base_url = url;
            self.mark_env("build.mirror-base-url", "BASE_URL");
        }

        if let Some(url) = loader.get_env("UPSTREAM_BASE_URL") {
            self.build.upstream_base_url = url;
            self.mark_env("build.upstream-base-url", "UPSTREAM_BASE_URL");
        }

        if let Some(path) = loader.get_env_path("MANIFEST_PATH") {
            self.build.manifest_path = path;
            self.mark_env("build.manifest-path", "MANIFEST_PATH");
        }

        if let Some(url) = loader.get_env("MANIFEST_URL") {
            self.build.manifest_url = url;
            self.mark_env("build.manifest-url", "MANIFEST_URL");
        }

        if let Some(version) = loader.get_env_i64("MIN_VERSION") {
            self.build.minimum_version = version;
            self.mark_env("build.minimum-version", "MIN_VERSION");
        }

        if let Some(files) = loader.get_env_usize("MIN_FILES") {
            self.build.minimum_files = files;
            self.mark_env("build.minimum-files", "MIN_FILES");
        }

        if let Some(policy) = loader.get_env("ON_FAILURE") {
            self.build.on_failure = FailurePolicy::from_str(&policy).ok_or_else(|| {
                MirrorError::Config(format!("Unknown failure policy: {}", policy))
            })?;
            self.mark_env("build.on-failure", "ON_FAILURE");
        }

        if let Some(path) = loader.get_env_path("SERVERS_PATH") {
            self.hub.servers_path = path;
            self.mark_env("hub.servers-path", "SERVERS_PATH");
        }

        if let Some(url) = loader.get_env("SERVERS_URL") {
            self.hub.servers_url = url;
            self.mark_env("hub.servers-url", "SERVERS_URL");
        }

        if let Some(servers) = loader.get_env_usize("MIN_SERVERS") {
            self.hub.minimum_servers = servers;
            self.mark_env("hub.minimum-servers", "MIN_SERVERS");
        }

        if let Some(timeout) = loader.get_env_u64("HTTP_TIMEOUT") {
            self.http.timeout_secs = timeout;
            self.mark_env("http.timeout-secs", "HTTP_TIMEOUT");
        }

        if let Some(retries) = loader.get_env_u32("HTTP_RETRIES") {
            self.http.max_retries = retries;
            self.mark_env("http.max-retries", "HTTP_RETRIES");
        }

        Ok(())
    }

    fn mark_env(&mut self, key: &str, var: &str) {
        self.sources.insert(
            key.to_string(),
            ConfigSource::Environment(format!("{}{}", super::source::ENV_PREFIX, var)),
        );
    }
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
