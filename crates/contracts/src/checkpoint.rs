//! Single-file checkpoint format.
//!
//! A checkpoint bundles the resolved [`RunConfig`] with the model weights in
//! one file, so evaluation and inference never depend on the original config
//! file or guessed hyperparameters. Weights are recorded with Burn's binary
//! recorder; the outer container is bincode.

use crate::{ContractError, ContractResult, RunConfig};
use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// File name used for the best checkpoint within the output directory.
pub const BEST_CHECKPOINT_NAME: &str = "best.ckpt";

#[derive(Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Resolved configuration the weights were trained with.
    pub config: RunConfig,
    /// Burn binary record of the model weights.
    model: Vec<u8>,
}

impl Checkpoint {
    /// Snapshot a model together with its run configuration.
    pub fn capture<B, M>(config: RunConfig, model: M) -> ContractResult<Self>
    where
        B: Backend,
        M: Module<B>,
    {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::new();
        let model_bytes = recorder.record(model.into_record(), ())?;
        Ok(Self {
            config,
            model: model_bytes,
        })
    }

    /// Load the recorded weights into a freshly constructed model of the
    /// same architecture.
    pub fn restore<B, M>(&self, model: M, device: &B::Device) -> ContractResult<M>
    where
        B: Backend,
        M: Module<B>,
    {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::new();
        let record = recorder.load(self.model.clone(), device)?;
        Ok(model.load_record(record))
    }

    /// Write the checkpoint, creating parent directories as needed. An
    /// existing file at `path` is overwritten.
    pub fn save(&self, path: &Path) -> ContractResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ContractError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = File::create(path).map_err(|source| ContractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> ContractResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| ContractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Cap decoding at the file size so a corrupt length prefix surfaces
        // as a codec error instead of an oversized allocation.
        let checkpoint = bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(bytes.len() as u64)
            .deserialize(&bytes)?;
        Ok(checkpoint)
    }
}
