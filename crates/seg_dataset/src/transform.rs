//! Image/mask transformation pipeline.

use crate::types::SegSample;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use rand::{Rng, SeedableRng};

/// Geometric/photometric transform applied to each sample on access.
///
/// The training variant enables randomized augmentation; the validation
/// variant resizes only, so reported metrics are not biased by augmentation.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Resize every image/mask to (width, height).
    pub target_size: (u32, u32),
    /// Probability of a horizontal flip (applied to image and mask together).
    pub flip_horizontal_prob: f32,
    /// Probability of a vertical flip (applied to image and mask together).
    pub flip_vertical_prob: f32,
    /// Probability of a light brightness/contrast jitter (image only).
    pub jitter_prob: f32,
    /// Max jitter scale for brightness/contrast.
    pub jitter_strength: f32,
    /// Seed for per-sample deterministic augmentation; None uses thread rng.
    pub seed: Option<u64>,
}

impl TransformConfig {
    /// Augmenting pipeline for the training subset.
    pub fn train(target_size: (u32, u32), seed: u64) -> Self {
        Self {
            target_size,
            flip_horizontal_prob: 0.5,
            flip_vertical_prob: 0.5,
            jitter_prob: 0.3,
            jitter_strength: 0.1,
            seed: Some(seed),
        }
    }

    /// Resize-only pipeline for validation, evaluation, and inference.
    pub fn valid(target_size: (u32, u32)) -> Self {
        Self {
            target_size,
            flip_horizontal_prob: 0.0,
            flip_vertical_prob: 0.0,
            jitter_prob: 0.0,
            jitter_strength: 0.0,
            seed: None,
        }
    }

    /// Apply the transform to a decoded pair. `pair_id` is mixed into the
    /// seed so each sample gets its own deterministic augmentation stream.
    pub fn apply(&self, img: &RgbImage, mask: &GrayImage, pair_id: u64) -> SegSample {
        let (w, h) = self.target_size;
        let mut img = imageops::resize(img, w, h, FilterType::Triangle);
        // Nearest keeps mask values crisp; binarization below handles the rest.
        let mut mask = imageops::resize(mask, w, h, FilterType::Nearest);

        let mut seeded;
        let mut local;
        let rng: &mut dyn rand::RngCore = if let Some(seed) = self.seed {
            seeded = rand::rngs::StdRng::seed_from_u64(seed ^ pair_id);
            &mut seeded
        } else {
            local = rand::rng();
            &mut local
        };

        if self.flip_horizontal_prob > 0.0 && rng.random_range(0.0..1.0) < self.flip_horizontal_prob
        {
            imageops::flip_horizontal_in_place(&mut img);
            imageops::flip_horizontal_in_place(&mut mask);
        }
        if self.flip_vertical_prob > 0.0 && rng.random_range(0.0..1.0) < self.flip_vertical_prob {
            imageops::flip_vertical_in_place(&mut img);
            imageops::flip_vertical_in_place(&mut mask);
        }
        maybe_jitter(&mut img, self.jitter_prob, self.jitter_strength, rng);

        let plane = (w * h) as usize;
        let mut image_chw = vec![0.0f32; plane * 3];
        for (x, y, pixel) in img.enumerate_pixels() {
            let base = (y * w + x) as usize;
            image_chw[base] = pixel[0] as f32 / 255.0;
            image_chw[plane + base] = pixel[1] as f32 / 255.0;
            image_chw[2 * plane + base] = pixel[2] as f32 / 255.0;
        }

        let mut mask_hw = vec![0.0f32; plane];
        for (x, y, pixel) in mask.enumerate_pixels() {
            mask_hw[(y * w + x) as usize] = if pixel[0] >= 128 { 1.0 } else { 0.0 };
        }

        SegSample {
            image_chw,
            mask_hw,
            width: w,
            height: h,
        }
    }
}

fn maybe_jitter(img: &mut RgbImage, prob: f32, strength: f32, rng: &mut dyn rand::RngCore) {
    if prob <= 0.0 || strength <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) >= prob {
        return;
    }
    let bright = 1.0 + rng.random_range(-strength..strength);
    let contrast = 1.0 + rng.random_range(-strength..strength);
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            let mut v = (v - 0.5) * contrast + 0.5;
            v *= bright;
            pixel[c] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fixture() -> (RgbImage, GrayImage) {
        let img = RgbImage::from_fn(8, 8, |x, _| image::Rgb([(x * 30) as u8, 10, 200]));
        let mask = GrayImage::from_fn(8, 8, |x, _| Luma([if x < 4 { 255 } else { 0 }]));
        (img, mask)
    }

    #[test]
    fn seeded_augmentation_is_deterministic_per_pair() {
        let (img, mask) = fixture();
        let tfms = TransformConfig::train((8, 8), 42);
        let a = tfms.apply(&img, &mask, 3);
        let b = tfms.apply(&img, &mask, 3);
        assert_eq!(a.image_chw, b.image_chw);
        assert_eq!(a.mask_hw, b.mask_hw);
    }

    #[test]
    fn mask_is_binarized_after_transform() {
        let (img, mask) = fixture();
        let tfms = TransformConfig::train((4, 4), 7);
        let sample = tfms.apply(&img, &mask, 0);
        assert!(sample.mask_hw.iter().all(|v| *v == 0.0 || *v == 1.0));
    }

    #[test]
    fn valid_transform_resizes_without_flipping() {
        let (img, mask) = fixture();
        let tfms = TransformConfig::valid((8, 8));
        let sample = tfms.apply(&img, &mask, 0);
        // Left half of the mask fixture is positive; a flip would move it.
        assert_eq!(sample.mask_hw[0], 1.0);
        assert_eq!(sample.mask_hw[7], 0.0);
        assert_eq!(sample.image_chw.len(), 3 * 8 * 8);
    }
}
