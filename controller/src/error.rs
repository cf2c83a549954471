//! Error types for the controller.

use std::path::PathBuf;

use fillsplit::AllocationError;

/// All errors that can occur while running the controller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to read input file {path}: {source}")]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse input JSON: {0}")]
    InputParse(#[from] serde_json::Error),

    #[error("allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("feeder error: {0}")]
    Feed(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
