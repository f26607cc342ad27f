//! Errors raised at the edges of the engine.
//!
//! Resolution itself never fails; only loading inputs can.

use std::path::PathBuf;

/// Failure while loading the IR or the generator configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse project IR: {0}")]
    Ir(#[from] serde_json::Error),

    #[error("failed to parse generator config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unknown substitution target '{0}'")]
    UnknownSubstitute(String),

    #[error("contract '{0}' not found")]
    UnknownContract(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
