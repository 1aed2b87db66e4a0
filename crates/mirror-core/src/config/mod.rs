//! Mirror configuration.
//!
//! Values are merged in priority order, highest first:
//!
//! 1. Environment variables (`MIRROR_*`)
//! 2. The TOML configuration file (`mirror.toml` by default)
//! 3. Built-in defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use mirror_core::config::MirrorConfig;
//! use std::path::Path;
//!
//! let config = MirrorConfig::build(Some(Path::new("mirror.toml")), true)
//!     .unwrap()
//!     .with_base_dir("/srv/mirror");
//!
//! println!("Artifacts go to {:?}", config.build.storage_root);
//! ```
//!
//! ```toml
//! [build]
//! storage-root = "builds/robust/builds/"
//! mirror-base-url = "https://cdn.example.com/builds/robust/builds/"
//! minimum-version = 132
//! on-failure = "abort"
//!
//! [hub]
//! minimum-servers = 3
//!
//! [http]
//! timeout-secs = 300
//! ```

mod config;
mod source;

pub use config::{BuildMirrorConfig, FailurePolicy, HttpSettings, HubMirrorConfig, MirrorConfig};
pub use source::{ConfigLoader, ConfigSource, ENV_PREFIX};
