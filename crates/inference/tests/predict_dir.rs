use contracts::{Checkpoint, RunConfig};
use image::{Rgb, RgbImage};
use inference::{run_inference, InferenceBackend};
use models::{EncoderPreset, UNet, UNetConfig};
use std::fs;
use std::path::Path;

fn tiny_checkpoint(path: &Path) {
    let mut cfg = RunConfig::default();
    cfg.model.encoder = "tiny".to_string();
    cfg.data.img_size = [16, 16];

    let device = Default::default();
    let model = UNet::<InferenceBackend>::new(UNetConfig::new(EncoderPreset::Tiny, 1), &device);
    Checkpoint::capture(cfg, model).unwrap().save(path).unwrap();
}

#[test]
fn writes_mask_and_overlay_per_image_and_skips_bad_files() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    fs::create_dir_all(&images).unwrap();

    // One decodable image at a non-model resolution, one corrupt file.
    let img = RgbImage::from_pixel(24, 20, Rgb([90, 140, 60]));
    img.save(images.join("field_01.png")).unwrap();
    fs::write(images.join("field_02.png"), b"").unwrap();

    let ckpt_path = tmp.path().join("best.ckpt");
    tiny_checkpoint(&ckpt_path);

    let out = tmp.path().join("out_preds");
    let summary = run_inference(&ckpt_path, &images, &out).unwrap();
    assert_eq!(summary.written, 1);
    assert_eq!(summary.skipped, 1);

    let mask = image::open(out.join("field_01_mask.png")).unwrap().to_luma8();
    // Mask is written at the model resolution and stays binary.
    assert_eq!(mask.dimensions(), (16, 16));
    assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));

    let overlay = image::open(out.join("field_01_overlay.png")).unwrap().to_rgb8();
    // Overlay matches the original image resolution.
    assert_eq!(overlay.dimensions(), (24, 20));

    // Nothing was written for the corrupt input.
    assert!(!out.join("field_02_mask.png").exists());
    assert!(!out.join("field_02_overlay.png").exists());
}

#[test]
fn empty_input_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    fs::create_dir_all(&images).unwrap();
    let ckpt_path = tmp.path().join("best.ckpt");
    tiny_checkpoint(&ckpt_path);

    let err = run_inference(&ckpt_path, &images, &tmp.path().join("out")).unwrap_err();
    assert!(err.to_string().contains("no image files"));
}

#[test]
fn missing_checkpoint_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let images = tmp.path().join("images");
    fs::create_dir_all(&images).unwrap();
    let err = run_inference(
        &tmp.path().join("absent.ckpt"),
        &images,
        &tmp.path().join("out"),
    )
    .unwrap_err();
    assert!(err.to_string().contains("io error"));
}
