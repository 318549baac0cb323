#![recursion_limit = "256"]

//! Training and evaluation for the microplastic segmentation model.

pub mod eval;
pub mod loss;
pub mod metrics;
pub mod trainer;

pub use eval::{evaluate, EvalReport};
pub use trainer::{run_train, EpochStats, TrainReport};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
