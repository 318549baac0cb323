//! Thresholded segmentation metrics.
//!
//! Both metrics binarize predictions and targets at 0.5, compute the overlap per
//! sample over flattened pixels, and average over the batch. The epsilon
//! keeps empty-prediction/empty-target samples at a perfect score instead
//! of dividing by zero.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};

pub const EPS: f64 = 1e-6;

fn flat_counts<B: Backend>(
    probs: Tensor<B, 4>,
    targets: Tensor<B, 4>,
) -> (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>) {
    let preds = probs.greater_elem(0.5).float().flatten::<2>(1, 3);
    let targets = targets.greater_elem(0.5).float().flatten::<2>(1, 3);
    let intersection = (preds.clone() * targets.clone()).sum_dim(1);
    (intersection, preds.sum_dim(1), targets.sum_dim(1))
}

/// Mean Dice coefficient over the batch: `2|P∩T| / (|P| + |T|)`.
pub fn dice_coef<B: Backend>(probs: Tensor<B, 4>, targets: Tensor<B, 4>) -> f64 {
    let (intersection, pred_sum, target_sum) = flat_counts(probs, targets);
    let dice = intersection
        .mul_scalar(2.0)
        .add_scalar(EPS)
        .div(pred_sum.add(target_sum).add_scalar(EPS));
    dice.mean().into_scalar().elem::<f64>()
}

/// Mean IoU over the batch: `|P∩T| / |P∪T|`.
pub fn iou<B: Backend>(probs: Tensor<B, 4>, targets: Tensor<B, 4>) -> f64 {
    let (intersection, pred_sum, target_sum) = flat_counts(probs, targets);
    let union = pred_sum.add(target_sum).sub(intersection.clone());
    let iou = intersection
        .add_scalar(EPS)
        .div(union.add_scalar(EPS));
    iou.mean().into_scalar().elem::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    fn tensor_from(values: &[f32], shape: [usize; 4]) -> Tensor<TestBackend, 4> {
        let device = Default::default();
        Tensor::<TestBackend, 1>::from_floats(values, &device).reshape(shape)
    }

    #[test]
    fn perfect_prediction_scores_one() {
        let target = tensor_from(&[1.0, 0.0, 1.0, 0.0], [1, 1, 2, 2]);
        // Probabilities on the right side of the threshold everywhere.
        let probs = tensor_from(&[0.9, 0.1, 0.8, 0.2], [1, 1, 2, 2]);
        assert!((dice_coef(probs.clone(), target.clone()) - 1.0).abs() < 1e-4);
        assert!((iou(probs, target) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn disjoint_prediction_scores_zero() {
        let target = tensor_from(&[1.0, 1.0, 0.0, 0.0], [1, 1, 2, 2]);
        let probs = tensor_from(&[0.1, 0.1, 0.9, 0.9], [1, 1, 2, 2]);
        assert!(dice_coef(probs.clone(), target.clone()) < 1e-3);
        assert!(iou(probs, target) < 1e-3);
    }

    #[test]
    fn empty_prediction_on_empty_target_is_perfect() {
        let target = tensor_from(&[0.0; 4], [1, 1, 2, 2]);
        let probs = tensor_from(&[0.1; 4], [1, 1, 2, 2]);
        assert!((dice_coef(probs.clone(), target.clone()) - 1.0).abs() < 1e-4);
        assert!((iou(probs, target) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn iou_never_exceeds_dice() {
        let target = tensor_from(&[1.0, 1.0, 1.0, 0.0], [1, 1, 2, 2]);
        let probs = tensor_from(&[0.9, 0.9, 0.1, 0.9], [1, 1, 2, 2]);
        let d = dice_coef(probs.clone(), target.clone());
        let i = iou(probs, target);
        assert!(i <= d + 1e-9);
        assert!(d > 0.0 && d < 1.0);
    }

    #[test]
    fn soft_targets_are_binarized_before_overlap() {
        // Targets on the right side of the threshold count as {0, 1}, so a
        // matching prediction still scores a perfect overlap.
        let target = tensor_from(&[0.9, 0.2, 0.7, 0.4], [1, 1, 2, 2]);
        let probs = tensor_from(&[0.8, 0.1, 0.6, 0.3], [1, 1, 2, 2]);
        assert!((dice_coef(probs.clone(), target.clone()) - 1.0).abs() < 1e-4);
        assert!((iou(probs, target) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn batch_metric_averages_per_sample() {
        // Sample 0 is perfect, sample 1 is fully wrong.
        let target = tensor_from(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], [2, 1, 2, 2]);
        let probs = tensor_from(&[0.9, 0.9, 0.9, 0.9, 0.1, 0.1, 0.1, 0.1], [2, 1, 2, 2]);
        let d = dice_coef(probs, target);
        assert!((d - 0.5).abs() < 1e-3);
    }
}
