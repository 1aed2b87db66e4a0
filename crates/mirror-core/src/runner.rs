//! Runs the build mirror and the hub mirror one after the other.

use std::sync::Arc;

use crate::config::MirrorConfig;
use crate::hub::{DirectorySyncEngine, HubSyncOutcome};
use crate::http::Transport;
use crate::manifest::{ManifestSyncEngine, ManifestSyncOutcome};
use crate::Result;

/// What each engine did during a run. `None` means the engine was disabled.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub build: Option<Result<ManifestSyncOutcome>>,
    pub hub: Option<Result<HubSyncOutcome>>,
}

impl RunSummary {
    /// True if every engine that ran finished without an error
    pub fn is_clean(&self) -> bool {
        self.build.as_ref().map_or(true, |r| r.is_ok()) && self.hub.as_ref().map_or(true, |r| r.is_ok())
    }
}

pub struct MirrorRunner {
    build: Option<ManifestSyncEngine>,
    hub: Option<DirectorySyncEngine>,
}

impl MirrorRunner {
    /// Both engines, sharing one transport
    pub fn new(config: &MirrorConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            build: Some(ManifestSyncEngine::new(config.build.clone(), Arc::clone(&transport))),
            hub: Some(DirectorySyncEngine::new(config.hub.clone(), transport)),
        }
    }

    pub fn with_engines(build: Option<ManifestSyncEngine>, hub: Option<DirectorySyncEngine>) -> Self {
        Self { build, hub }
    }

    pub fn without_build(mut self) -> Self {
        self.build = None;
        self
    }

    pub fn without_hub(mut self) -> Self {
        self.hub = None;
        self
    }

    /// Run each enabled engine in turn. An error in one is logged and
    /// recorded but never stops the other, and is never returned.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        if let Some(engine) = &self.build {
            let result = engine.sync().await;
            if let Err(e) = &result {
                log::error!("Build mirror failed: {}", e);
            }
            summary.build = Some(result);
        }

        if let Some(engine) = &self.hub {
            let result = engine.sync().await;
            if let Err(e) = &result {
                log::error!("Hub mirror failed: {}", e);
            }
            summary.hub = Some(result);
        }

        summary
    }
}
