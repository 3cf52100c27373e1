//! Error types for set-up and parameter handling. The audio path itself never
//! fails.

use crate::params::ParamId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamError {
    #[error("{id} must be within [{min}, {max}], got {value}")]
    OutOfRange { id: ParamId, value: f32, min: f32, max: f32 },

    #[error("unknown parameter id \"{0}\"")]
    UnknownId(String),

    #[error("malformed parameter state: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parameter state does not match its schema: {0}")]
    Schema(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed engine configuration: {0}")]
    ConfigDecode(#[from] serde_json::Error),

    #[error("failed to spawn a worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error(transparent)]
    Param(#[from] ParamError),
}

pub type EngineResult<T> = Result<T, EngineError>;
