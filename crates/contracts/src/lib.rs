//! Shared contracts between the training, evaluation, and inference stages:
//! the run configuration schema and the checkpoint file format.

pub mod checkpoint;
pub mod config;

pub use checkpoint::{Checkpoint, BEST_CHECKPOINT_NAME};
pub use config::{DataConfig, ModelConfig, RunConfig, TrainConfig};

use std::path::PathBuf;
use thiserror::Error;

pub type ContractResult<T> = Result<T, ContractError>;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("weight record error: {0}")]
    Record(#[from] burn::record::RecorderError),
    #[error("checkpoint codec error: {0}")]
    Codec(#[from] bincode::Error),
}
