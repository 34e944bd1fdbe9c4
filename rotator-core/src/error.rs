/// Error types shared by the rotator crates
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by catalog lookup, configuration and model loading.
///
/// Math-layer problems (non-finite velocity samples) are absorbed where they
/// occur and only ever appear here for logging.
#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("model not found in catalog: {0}")]
    ModelNotFound(String),
    #[error("model catalog is empty")]
    EmptyCatalog,
    #[error("failed to load model {model}: {reason}")]
    ModelLoadFailure { model: String, reason: String },
    #[error("invalid velocity sample ({x}, {y})")]
    InvalidVelocitySample { x: f32, y: f32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T, E = RotatorError> = std::result::Result<T, E>;
