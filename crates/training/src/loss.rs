//! Composite segmentation loss: binary cross-entropy on the logits plus a
//! soft (unthresholded) Dice penalty at half weight. BCE drives per-pixel
//! calibration; the Dice term counteracts the foreground/background
//! imbalance typical of particle masks.

use crate::metrics::EPS;
use burn::tensor::activation::sigmoid;
use burn::tensor::{backend::Backend, Tensor};

/// Weight of the Dice penalty relative to BCE.
pub const DICE_WEIGHT: f64 = 0.5;

const PROB_FLOOR: f64 = 1e-7;

/// Binary cross-entropy over logits, averaged over all pixels.
pub fn bce_with_logits<B: Backend>(logits: Tensor<B, 4>, targets: Tensor<B, 4>) -> Tensor<B, 1> {
    let probs = sigmoid(logits).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
    let positive = targets.clone() * probs.clone().log();
    let negative = targets.neg().add_scalar(1.0) * probs.neg().add_scalar(1.0).log();
    (positive + negative).mean().neg()
}

/// Soft Dice over probabilities, averaged per sample. Stays differentiable
/// by skipping the 0.5 threshold the reported metrics use.
pub fn soft_dice<B: Backend>(probs: Tensor<B, 4>, targets: Tensor<B, 4>) -> Tensor<B, 1> {
    let probs = probs.flatten::<2>(1, 3);
    let targets = targets.flatten::<2>(1, 3);
    let intersection = (probs.clone() * targets.clone()).sum_dim(1);
    let denom = probs.sum_dim(1) + targets.sum_dim(1);
    let dice = intersection
        .mul_scalar(2.0)
        .add_scalar(EPS)
        .div(denom.add_scalar(EPS));
    dice.mean()
}

/// Training objective: `BCE + 0.5 * (1 - soft_dice)`.
pub fn segmentation_loss<B: Backend>(logits: Tensor<B, 4>, targets: Tensor<B, 4>) -> Tensor<B, 1> {
    let probs = sigmoid(logits.clone());
    let dice_penalty = soft_dice(probs, targets.clone())
        .neg()
        .add_scalar(1.0)
        .mul_scalar(DICE_WEIGHT);
    bce_with_logits(logits, targets) + dice_penalty
}
