//! CLI error handling

use std::path::PathBuf;

use airspace_lib::CatalogError;

/// Errors that end a CLI run
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read input '{path}': {source}")]
    ReadInput {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write output '{path}': {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid default color {0:?}")]
    InvalidColor(String),

    #[error("unusable record payload: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}
