//! Batch iteration for training, validation, and evaluation.

use crate::dataset::SegmentationDataset;
use crate::types::{DatasetResult, SegDatasetError, SegSample};
use burn::tensor::{backend::Backend, Tensor};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

/// One batch of stacked samples.
pub struct SegBatch<B: Backend> {
    /// `[batch, 3, H, W]`, values in [0, 1].
    pub images: Tensor<B, 4>,
    /// `[batch, 1, H, W]`, values in {0, 1}.
    pub masks: Tensor<B, 4>,
}

/// Sequential batch cursor over a dataset. Sample decoding within a batch is
/// parallelized with rayon; batches themselves are consumed strictly in
/// order, so no batch overlaps another's parameter update.
pub struct BatchIter<'d> {
    dataset: &'d SegmentationDataset,
    order: Vec<usize>,
    cursor: usize,
}

impl<'d> BatchIter<'d> {
    /// New iterator over the whole dataset. With `shuffle`, the visit order
    /// is permuted with the given seed; pass a per-epoch seed for fresh
    /// orderings across epochs.
    pub fn new(dataset: &'d SegmentationDataset, shuffle: bool, seed: Option<u64>) -> Self {
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if shuffle {
            let mut rng = match seed {
                Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
                None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
            };
            order.shuffle(&mut rng);
        }
        Self {
            dataset,
            order,
            cursor: 0,
        }
    }

    /// Assemble the next batch, or `None` once the dataset is exhausted.
    /// Any decode failure is propagated; training treats it as fatal.
    pub fn next_batch<B: Backend>(
        &mut self,
        batch_size: usize,
        device: &B::Device,
    ) -> DatasetResult<Option<SegBatch<B>>> {
        if self.cursor >= self.order.len() {
            return Ok(None);
        }
        let batch_size = batch_size.max(1);
        let end = (self.cursor + batch_size).min(self.order.len());
        let slice = &self.order[self.cursor..end];
        self.cursor = end;

        let samples: Vec<SegSample> = slice
            .par_iter()
            .map(|&i| self.dataset.get(i))
            .collect::<DatasetResult<Vec<_>>>()?;

        let (width, height) = (samples[0].width, samples[0].height);
        for sample in &samples[1..] {
            if (sample.width, sample.height) != (width, height) {
                return Err(SegDatasetError::ShapeMismatch {
                    expected_w: width,
                    expected_h: height,
                    got_w: sample.width,
                    got_h: sample.height,
                });
            }
        }

        let batch_len = samples.len();
        let plane = (width * height) as usize;
        let mut images_buf = Vec::with_capacity(batch_len * 3 * plane);
        let mut masks_buf = Vec::with_capacity(batch_len * plane);
        for sample in &samples {
            images_buf.extend_from_slice(&sample.image_chw);
            masks_buf.extend_from_slice(&sample.mask_hw);
        }

        let images = Tensor::<B, 1>::from_floats(images_buf.as_slice(), device).reshape([
            batch_len,
            3,
            height as usize,
            width as usize,
        ]);
        let masks = Tensor::<B, 1>::from_floats(masks_buf.as_slice(), device).reshape([
            batch_len,
            1,
            height as usize,
            width as usize,
        ]);

        Ok(Some(SegBatch { images, masks }))
    }
}
