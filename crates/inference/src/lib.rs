#![recursion_limit = "256"]

//! Batch inference: run a checkpoint over a directory of images and write a
//! predicted mask plus a red overlay for each one.

use burn::tensor::activation::sigmoid;
use burn::tensor::{backend::Backend, Tensor};
use contracts::Checkpoint;
use models::{EncoderPreset, UNet, UNetConfig};
use std::fs;
use std::path::Path;
use vision_core::{blend_overlay, mask_to_image, resize_mask_nearest, OVERLAY_ALPHA, OVERLAY_COLOR};

#[cfg(feature = "backend-wgpu")]
pub type InferenceBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type InferenceBackend = burn_ndarray::NdArray<f32>;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, Default)]
pub struct InferenceSummary {
    /// Images for which a mask and overlay were written.
    pub written: usize,
    /// Files skipped because they could not be decoded.
    pub skipped: usize,
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Convert an image to a `[1, 3, H, W]` tensor at the model's resolution.
fn image_to_tensor<B: Backend>(
    img: &image::RgbImage,
    device: &B::Device,
) -> Tensor<B, 4> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for (x, y, pixel) in img.enumerate_pixels() {
        let base = (y * width + x) as usize;
        chw[base] = pixel[0] as f32 / 255.0;
        chw[plane + base] = pixel[1] as f32 / 255.0;
        chw[2 * plane + base] = pixel[2] as f32 / 255.0;
    }
    Tensor::<B, 1>::from_floats(chw.as_slice(), device).reshape([
        1,
        3,
        height as usize,
        width as usize,
    ])
}

/// Predict masks for every image under `images_dir`, writing
/// `{stem}_mask.png` (at model resolution) and `{stem}_overlay.png` (at the
/// original resolution) into `out_dir`.
///
/// Undecodable files are logged and skipped; a bad input never aborts the
/// rest of the batch.
pub fn run_inference(
    checkpoint_path: &Path,
    images_dir: &Path,
    out_dir: &Path,
) -> anyhow::Result<InferenceSummary> {
    let checkpoint = Checkpoint::load(checkpoint_path)?;
    let encoder = EncoderPreset::from_name(&checkpoint.config.model.encoder).ok_or_else(|| {
        anyhow::anyhow!(
            "checkpoint references unknown encoder '{}'",
            checkpoint.config.model.encoder
        )
    })?;
    let (model_w, model_h) = checkpoint.config.target_size();

    let device = <InferenceBackend as Backend>::Device::default();
    let model = UNet::<InferenceBackend>::new(UNetConfig::new(encoder, 1), &device);
    let model = checkpoint.restore(model, &device)?;

    fs::create_dir_all(out_dir)?;

    let mut files: Vec<_> = fs::read_dir(images_dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    files.sort();
    anyhow::ensure!(
        !files.is_empty(),
        "no image files found under {}",
        images_dir.display()
    );

    let mut summary = InferenceSummary::default();
    for path in files {
        let original = match image::open(&path) {
            Ok(img) => img.to_rgb8(),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping undecodable image");
                summary.skipped += 1;
                continue;
            }
        };

        let resized =
            image::imageops::resize(&original, model_w, model_h, image::imageops::FilterType::Triangle);
        let input = image_to_tensor::<InferenceBackend>(&resized, &device);
        let probs = sigmoid(model.forward(input));
        let mask_plane: Vec<f32> = probs
            .reshape([(model_w * model_h) as usize])
            .into_data()
            .to_vec()
            .map_err(|err| anyhow::anyhow!("failed to read prediction tensor: {err:?}"))?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let mask_img = mask_to_image(&mask_plane, model_w, model_h);
        mask_img.save(out_dir.join(format!("{stem}_mask.png")))?;

        // Overlay at the original resolution.
        let (orig_w, orig_h) = original.dimensions();
        let mask_full = resize_mask_nearest(&mask_img, orig_w, orig_h);
        let overlay = blend_overlay(&original, &mask_full, OVERLAY_COLOR, OVERLAY_ALPHA);
        overlay.save(out_dir.join(format!("{stem}_overlay.png")))?;

        summary.written += 1;
        tracing::debug!(path = %path.display(), "wrote mask and overlay");
    }

    Ok(summary)
}
