use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

#[derive(Error, Debug)]
pub enum MirrorError {
    // JSON/parsing errors
    #[error("Failed to parse upstream document: {0}")]
    Json(#[from] serde_json::Error),

    // Network errors
    #[error("Transport error: {0}")]
    Http(#[from] HttpError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, MirrorError>;
