use thiserror::Error;

use crate::core::types::ModelId;

/// Faults in a transducer array configuration
///
/// These are setup-time faults: the model they belong to is never started
/// with a half-valid array.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("transducer count must be in 1..={}, got {0}", crate::sensor::transducer::MAX_TRANSDUCERS)]
    InvalidCount(i64),

    #[error("{key}[{index}] overrides a transducer outside an array of {count}")]
    IndexOutOfRange {
        key: &'static str,
        index: usize,
        count: usize,
    },

    #[error("{key}[{index}] is supplied more than once")]
    DuplicateOverride { key: &'static str, index: usize },

    #[error("malformed field {key}: {reason}")]
    MalformedField { key: String, reason: String },

    #[error("{0} array was destroyed and cannot be reconfigured")]
    Destroyed(&'static str),
}

/// Failure of a single model's update, isolated by the scheduler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    #[error("update called while the model is {0}")]
    NotRunning(&'static str),

    #[error("update failed: {0}")]
    Failed(String),

    #[error("update panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error("Model not found: {0}")]
    ModelNotFound(ModelId),

    #[error("Model {0} has no sensor array")]
    NotASensor(ModelId),

    #[error("Invalid configuration for {model}: {source}")]
    Config {
        model: ModelId,
        #[source]
        source: ConfigError,
    },

    #[error("Invalid simulation config: {0}")]
    InvalidSimulationConfig(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StageError>;
