//! Error types for scholar-sim.

use std::path::PathBuf;

use scholar_bus::BusError;
use scholar_resource::ResourceError;
use thiserror::Error;

/// Errors raised while loading or starting a scenario.
#[derive(Debug, Error)]
pub enum SimError {
    /// The scenario is inconsistent.
    #[error("invalid scenario: {0}")]
    Config(String),

    /// The scenario file could not be read or written.
    #[error("scenario file '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The scenario file is not valid JSON for a scenario.
    #[error("scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A participant could not be attached to the bus.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// The resource manager rejected its configuration.
    #[error("resource manager: {0}")]
    Resource(#[from] ResourceError),

    /// A participant task panicked or was aborted.
    #[error("participant task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for scenario operations.
pub type Result<T> = std::result::Result<T, SimError>;
