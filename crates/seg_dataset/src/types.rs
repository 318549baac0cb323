//! Core types and error definitions for seg_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, SegDatasetError>;

#[derive(Debug, Error)]
pub enum SegDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no mask found for image {image}")]
    MissingMask { image: PathBuf },
    #[error("no image files found under {path}")]
    EmptyDataset { path: PathBuf },
    #[error("batch contains varying sample shapes: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    ShapeMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },
}

/// One decoded and transformed image/mask pair.
#[derive(Debug, Clone)]
pub struct SegSample {
    /// Image in CHW layout, normalized to [0, 1].
    pub image_chw: Vec<f32>,
    /// Mask in HW layout, binarized to {0, 1}.
    pub mask_hw: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

/// Index entry pairing an image file with its mask file.
#[derive(Debug, Clone)]
pub struct PairEntry {
    pub image_path: PathBuf,
    pub mask_path: PathBuf,
    /// Stable per-pair id, used to derive deterministic augmentation seeds.
    pub pair_id: u64,
}

/// Counts produced by the dataset QA pass.
#[derive(Debug, Clone, Default)]
pub struct DatasetSummary {
    pub images: usize,
    pub paired: usize,
    pub missing_mask: usize,
    pub undecodable: usize,
}
