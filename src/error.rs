//! Error types for clutch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("setup error: {0}")]
    Setup(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
