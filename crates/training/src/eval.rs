//! Offline evaluation of a saved checkpoint against a labeled directory pair.

use crate::metrics::{dice_coef, iou};
use crate::TrainBackend;
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use contracts::Checkpoint;
use models::{EncoderPreset, UNet, UNetConfig};
use seg_dataset::{BatchIter, SegmentationDataset, TransformConfig};
use std::path::Path;

/// Fixed evaluation batch size; evaluation is not throughput sensitive.
const EVAL_BATCH_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct EvalReport {
    pub dice: f64,
    pub iou: f64,
    pub samples: usize,
    pub batches: usize,
}

/// Score a checkpoint on every image/mask pair under the given directories.
///
/// Preprocessing comes from the configuration embedded in the checkpoint, so
/// the model always sees the resolution it was trained at. No augmentation
/// is applied.
pub fn evaluate(
    checkpoint_path: &Path,
    images_dir: &Path,
    masks_dir: &Path,
) -> anyhow::Result<EvalReport> {
    let checkpoint = Checkpoint::load(checkpoint_path)?;
    let encoder = EncoderPreset::from_name(&checkpoint.config.model.encoder).ok_or_else(|| {
        anyhow::anyhow!(
            "checkpoint references unknown encoder '{}'",
            checkpoint.config.model.encoder
        )
    })?;

    let device = <TrainBackend as Backend>::Device::default();
    let model = UNet::<TrainBackend>::new(UNetConfig::new(encoder, 1), &device);
    let model = checkpoint.restore(model, &device)?;

    let dataset = SegmentationDataset::from_dirs(
        images_dir,
        masks_dir,
        TransformConfig::valid(checkpoint.config.target_size()),
    )?;
    let samples = dataset.len();
    tracing::info!(samples, "evaluating checkpoint");

    let mut iter = BatchIter::new(&dataset, false, None);
    let mut dice_sum = 0.0;
    let mut iou_sum = 0.0;
    let mut batches = 0usize;
    while let Some(batch) = iter.next_batch::<TrainBackend>(EVAL_BATCH_SIZE, &device)? {
        let probs = sigmoid(model.forward(batch.images));
        dice_sum += dice_coef(probs.clone(), batch.masks.clone());
        iou_sum += iou(probs, batch.masks);
        batches += 1;
    }

    Ok(EvalReport {
        dice: dice_sum / batches as f64,
        iou: iou_sum / batches as f64,
        samples,
        batches,
    })
}
