use thiserror::Error;

use crate::dom::page_loader::PageError;
use crate::protect::store::StoreError;

/// Errors surfaced by the CLI and script layers. The on-page engine
/// itself never fails: it logs and degrades instead.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse script: {0}")]
    Script(#[from] serde_yaml::Error),

    #[error("element '{key}' not found: {context}")]
    ElementNotFound { key: String, context: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
