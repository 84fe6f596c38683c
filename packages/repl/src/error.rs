//! Shell errors.

use std::path::PathBuf;

/// Errors raised while loading configuration or building the router.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("cannot read {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    ParseConfig(#[from] serde_json::Error),

    #[error("locator {locator} names undefined type '{type_name}'")]
    UnknownType { locator: String, type_name: String },

    #[error("store '{store}' has an invalid identity field: {source}")]
    InvalidIdentity {
        store: String,
        #[source]
        source: rowmap_core::Error,
    },

    #[error(transparent)]
    Router(#[from] rowmap_core::Error),

    #[error(transparent)]
    Io(#[from] crate::io::IoError),
}
