//! Dataset loading, splitting, and Burn-compatible batching for the
//! microplastic segmentation workflow.
//!
//! This crate provides:
//! - Indexing of paired image/mask directories
//! - Train/val splitting with a seeded shuffle
//! - Resize/flip/jitter transform pipelines (augmentation is train-only)
//! - Batch iteration producing Burn tensors

pub mod batch;
pub mod dataset;
pub mod splits;
pub mod transform;
pub mod types;

pub use batch::{BatchIter, SegBatch};
pub use dataset::{summarize, SegmentationDataset};
pub use splits::split_pairs;
pub use transform::TransformConfig;
pub use types::{DatasetResult, DatasetSummary, PairEntry, SegDatasetError, SegSample};
