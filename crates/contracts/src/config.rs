//! Run configuration shared by training, evaluation, and inference.
//!
//! Every field has a default, so an empty TOML file yields a runnable
//! configuration. The resolved config is embedded into checkpoints so later
//! stages reconstruct the exact model and preprocessing.

use crate::{ContractError, ContractResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Dataset root; images live in `<root>/images`, masks in `<root>/masks`.
    pub root: PathBuf,
    /// Working resolution as [width, height]. Both sides must be divisible
    /// by the encoder stride.
    pub img_size: [u32; 2],
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            img_size: [512, 512],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Fraction of pairs held out for validation. At least one pair is
    /// always held out.
    pub val_ratio: f32,
    pub batch_size: usize,
    /// Worker threads for batch decoding; 0 leaves the pool at its default.
    pub num_workers: usize,
    /// Seed for the split shuffle, augmentation, and weight init.
    pub seed: u64,
    pub lr: f64,
    pub weight_decay: f64,
    pub epochs: usize,
    /// Directory receiving `best.ckpt`.
    pub out_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            val_ratio: 0.2,
            batch_size: 4,
            num_workers: 2,
            seed: 42,
            lr: 1e-3,
            weight_decay: 1e-5,
            epochs: 30,
            out_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Encoder preset name, e.g. "resnet34".
    pub encoder: String,
    /// Requested initialization. Pretrained weights are not shipped; any
    /// value other than "none"/"random" is honored with random init and a
    /// warning at startup.
    pub encoder_weights: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            encoder: "resnet34".to_string(),
            encoder_weights: "imagenet".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub data: DataConfig,
    pub train: TrainConfig,
    pub model: ModelConfig,
}

impl RunConfig {
    /// Parse a TOML run config. Missing fields fall back to defaults;
    /// unknown fields are rejected so typos do not silently vanish.
    pub fn load(path: &Path) -> ContractResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ContractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ContractError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data.root.join("images")
    }

    pub fn masks_dir(&self) -> PathBuf {
        self.data.root.join("masks")
    }

    /// Working resolution as (width, height).
    pub fn target_size(&self) -> (u32, u32) {
        (self.data.img_size[0], self.data.img_size[1])
    }
}
