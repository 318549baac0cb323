//! Training loop with best-checkpoint selection on validation Dice.

use crate::loss::segmentation_loss;
use crate::metrics::{dice_coef, iou};
use crate::TrainBackend;
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::tensor::activation::sigmoid;
use burn::tensor::{backend::Backend, ElementConversion};
use contracts::{Checkpoint, RunConfig, BEST_CHECKPOINT_NAME};
use models::{EncoderPreset, UNet, UNetConfig};
use seg_dataset::{split_pairs, BatchIter, SegmentationDataset, TransformConfig};
use std::path::PathBuf;

type AD = Autodiff<TrainBackend>;

/// Per-epoch training and validation summary.
#[derive(Debug, Clone)]
pub struct EpochStats {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_dice: f64,
    pub val_loss: f64,
    pub val_dice: f64,
    pub val_iou: f64,
    /// Whether this epoch produced a new best checkpoint.
    pub saved: bool,
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: Vec<EpochStats>,
    pub best_dice: f64,
    pub checkpoint_path: PathBuf,
}

/// Run the full training loop described by `config`.
///
/// The dataset is split once up front; train and validation subsets each own
/// their dataset view, so augmentation never leaks into validation. The
/// checkpoint at `out_dir/best.ckpt` is overwritten whenever validation Dice
/// strictly improves.
pub fn run_train(config: &RunConfig) -> anyhow::Result<TrainReport> {
    let encoder = EncoderPreset::from_name(&config.model.encoder).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown encoder '{}' (known encoders: {})",
            config.model.encoder,
            EncoderPreset::known_names().join(", ")
        )
    })?;
    match config.model.encoder_weights.as_str() {
        "none" | "random" => {}
        requested => tracing::warn!(
            requested,
            "pretrained encoder weights are not available; initializing randomly"
        ),
    }

    let (width, height) = config.target_size();
    let stride = encoder.stride();
    anyhow::ensure!(
        width % stride == 0 && height % stride == 0,
        "img_size {width}x{height} must be divisible by the {} encoder stride {stride}",
        encoder.name()
    );

    AD::seed(config.train.seed);
    let device = <TrainBackend as Backend>::Device::default();

    let entries = SegmentationDataset::index(&config.images_dir(), &config.masks_dir())?;
    let (train_entries, val_entries) =
        split_pairs(entries, config.train.val_ratio, config.train.seed);
    anyhow::ensure!(
        !train_entries.is_empty(),
        "need at least 2 image/mask pairs to hold out a validation sample"
    );
    tracing::info!(
        train = train_entries.len(),
        val = val_entries.len(),
        "dataset split"
    );

    let train_ds = SegmentationDataset::new(
        train_entries,
        TransformConfig::train((width, height), config.train.seed),
    );
    let val_ds = SegmentationDataset::new(val_entries, TransformConfig::valid((width, height)));

    let mut model = UNet::<AD>::new(UNetConfig::new(encoder, 1), &device);
    let mut optim = AdamWConfig::new()
        .with_weight_decay(config.train.weight_decay as f32)
        .init();

    let checkpoint_path = config.train.out_dir.join(BEST_CHECKPOINT_NAME);
    let mut best_dice = f64::NEG_INFINITY;
    let mut epochs = Vec::with_capacity(config.train.epochs);

    for epoch in 1..=config.train.epochs {
        // Fresh visit order each epoch; augmentation stays tied to pair ids.
        let mut train_iter = BatchIter::new(
            &train_ds,
            true,
            Some(config.train.seed.wrapping_add(epoch as u64)),
        );
        let mut train_loss = 0.0;
        let mut train_dice = 0.0;
        let mut train_batches = 0usize;
        while let Some(batch) =
            train_iter.next_batch::<AD>(config.train.batch_size, &device)?
        {
            let logits = model.forward(batch.images);
            let loss = segmentation_loss(logits.clone(), batch.masks.clone());
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.train.lr, model, grads);

            train_loss += loss.detach().into_scalar().elem::<f64>();
            train_dice += dice_coef(sigmoid(logits.detach()), batch.masks.detach());
            train_batches += 1;
        }
        let train_loss = train_loss / train_batches as f64;
        let train_dice = train_dice / train_batches as f64;

        let val_model = model.valid();
        let mut val_iter = BatchIter::new(&val_ds, false, None);
        let mut val_loss = 0.0;
        let mut val_dice = 0.0;
        let mut val_iou = 0.0;
        let mut val_batches = 0usize;
        while let Some(batch) =
            val_iter.next_batch::<TrainBackend>(config.train.batch_size, &device)?
        {
            let logits = val_model.forward(batch.images);
            let probs = sigmoid(logits.clone());
            val_loss += segmentation_loss(logits, batch.masks.clone())
                .into_scalar()
                .elem::<f64>();
            val_dice += dice_coef(probs.clone(), batch.masks.clone());
            val_iou += iou(probs, batch.masks);
            val_batches += 1;
        }
        let val_loss = val_loss / val_batches as f64;
        let val_dice = val_dice / val_batches as f64;
        let val_iou = val_iou / val_batches as f64;

        // Strict improvement only; ties keep the earlier checkpoint.
        let saved = val_dice > best_dice;
        if saved {
            best_dice = val_dice;
            let checkpoint = Checkpoint::capture(config.clone(), val_model.clone())?;
            checkpoint.save(&checkpoint_path)?;
            tracing::info!(
                epoch,
                val_dice,
                path = %checkpoint_path.display(),
                "saved new best checkpoint"
            );
        }

        tracing::info!(
            epoch,
            train_loss,
            train_dice,
            val_loss,
            val_dice,
            val_iou,
            "epoch complete"
        );
        epochs.push(EpochStats {
            epoch,
            train_loss,
            train_dice,
            val_loss,
            val_dice,
            val_iou,
            saved,
        });
    }

    Ok(TrainReport {
        epochs,
        best_dice,
        checkpoint_path,
    })
}
