//! Hub server list mirroring.
//!
//! The upstream list is published verbatim once enough entries carry an
//! address; nothing is downloaded or rewritten per entry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::HubMirrorConfig;
use crate::http::Transport;
use crate::publish::write_atomic;
use crate::Result;

/// One advertised server. Only `address` is looked at.
pub type ServerEntry = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerListDocument {
    pub servers: Vec<ServerEntry>,
}

impl ServerListDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of entries with a non-empty string `address`
    pub fn addressed_count(&self) -> usize {
        self.servers
            .iter()
            .filter(|server| {
                server
                    .get("address")
                    .and_then(Value::as_str)
                    .is_some_and(|address| !address.is_empty())
            })
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubSyncOutcome {
    Published { servers: usize },
    BelowThreshold { servers: usize },
}

impl HubSyncOutcome {
    pub fn servers(&self) -> usize {
        match self {
            HubSyncOutcome::Published { servers } | HubSyncOutcome::BelowThreshold { servers } => *servers,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, HubSyncOutcome::Published { .. })
    }
}

/// Mirrors the hub's server directory listing.
pub struct DirectorySyncEngine {
    config: HubMirrorConfig,
    transport: Arc<dyn Transport>,
}

impl DirectorySyncEngine {
    pub fn new(config: HubMirrorConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &HubMirrorConfig {
        &self.config
    }

    pub async fn sync(&self) -> Result<HubSyncOutcome> {
        log::debug!("Fetching server list {}", self.config.servers_url);
        let bytes = self.transport.fetch_bytes(&self.config.servers_url).await?;
        let list = ServerListDocument::from_slice(&bytes)?;

        let servers = list.addressed_count();
        log::info!("Processed {} servers.", servers);

        if servers < self.config.minimum_servers {
            log::warn!(
                "Not enough servers ({} < {}), keeping previous list.",
                servers,
                self.config.minimum_servers
            );
            return Ok(HubSyncOutcome::BelowThreshold { servers });
        }

        let json = list.to_pretty_json()?;
        write_atomic(&self.config.servers_path, json.as_bytes())?;
        log::info!("Wrote out servers: {}", self.config.servers_path.display());

        Ok(HubSyncOutcome::Published { servers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTransport;
    use crate::MirrorError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SERVERS_URL: &str = "https://central/hub/api/servers";

    fn config(root: &Path) -> HubMirrorConfig {
        HubMirrorConfig {
            servers_path: root.join("hub").join("api").join("servers"),
            servers_url: SERVERS_URL.to_string(),
            minimum_servers: 3,
        }
    }

    fn engine_serving(root: &Path, body: &str) -> DirectorySyncEngine {
        let transport = Arc::new(MemoryTransport::new());
        transport.serve(SERVERS_URL, body);
        DirectorySyncEngine::new(config(root), transport)
    }

    #[test]
    fn test_addressed_count() {
        let list = ServerListDocument::from_slice(
            br#"[
                {"address": "ss14://one.example"},
                {"address": ""},
                {"address": null},
                {"address": 42},
                {"name": "no address"},
                {"address": "ss14://two.example", "statusData": {"players": 3}}
            ]"#,
        )
        .unwrap();

        assert_eq!(list.servers.len(), 6);
        assert_eq!(list.addressed_count(), 2);
    }

    #[tokio::test]
    async fn test_publishes_list_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let body = r#"[{"address":"ss14://a","statusData":{"name":"A","players":1}},{"address":"ss14://b"},{"address":"ss14://c","inferredTags":["region:eu"]}]"#;
        let engine = engine_serving(temp_dir.path(), body);

        let outcome = engine.sync().await.unwrap();

        assert_eq!(outcome, HubSyncOutcome::Published { servers: 3 });
        let written = fs::read_to_string(&engine.config().servers_path).unwrap();
        let expected: Value = serde_json::from_str(body).unwrap();
        assert_eq!(written, serde_json::to_string_pretty(&expected).unwrap());
    }

    #[tokio::test]
    async fn test_below_threshold_keeps_previous_list() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_serving(temp_dir.path(), r#"[{"address":"ss14://a"},{"address":""},{"address":"ss14://b"}]"#);
        let path = engine.config().servers_path.clone();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"previous").unwrap();

        let outcome = engine.sync().await.unwrap();

        assert_eq!(outcome, HubSyncOutcome::BelowThreshold { servers: 2 });
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_non_list_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_serving(temp_dir.path(), r#"{"error": "rate limited"}"#);

        let result = engine.sync().await;

        assert!(matches!(result, Err(MirrorError::Json(_))));
        assert!(!engine.config().servers_path.exists());
    }

    #[tokio::test]
    async fn test_upstream_unreachable_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let engine = DirectorySyncEngine::new(config(temp_dir.path()), Arc::new(MemoryTransport::new()));

        let result = engine.sync().await;

        assert!(matches!(result, Err(MirrorError::Http(_))));
    }
}
