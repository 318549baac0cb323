use contracts::RunConfig;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use training::{evaluate, run_train};

fn write_pair(images: &Path, masks: &Path, name: &str) {
    // A bright blob on a dark background, with the mask marking the blob.
    let img = RgbImage::from_fn(32, 32, |x, y| {
        if x >= 8 && x < 24 && y >= 8 && y < 24 {
            Rgb([220, 220, 220])
        } else {
            Rgb([20, 20, 20])
        }
    });
    let mask = GrayImage::from_fn(32, 32, |x, y| {
        Luma([if x >= 8 && x < 24 && y >= 8 && y < 24 {
            255
        } else {
            0
        }])
    });
    img.save(images.join(format!("{name}.png"))).unwrap();
    mask.save(masks.join(format!("{name}.png"))).unwrap();
}

fn smoke_config(root: &Path, out_dir: &Path) -> RunConfig {
    let mut cfg = RunConfig::default();
    cfg.data.root = root.to_path_buf();
    cfg.data.img_size = [32, 32];
    cfg.model.encoder = "tiny".to_string();
    cfg.model.encoder_weights = "none".to_string();
    cfg.train.epochs = 2;
    cfg.train.batch_size = 2;
    cfg.train.val_ratio = 0.2;
    cfg.train.seed = 7;
    cfg.train.out_dir = out_dir.to_path_buf();
    cfg
}

#[test]
fn train_saves_best_checkpoint_and_eval_scores_it() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("data");
    let images = root.join("images");
    let masks = root.join("masks");
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&masks).unwrap();
    for i in 0..5 {
        write_pair(&images, &masks, &format!("blob_{i}"));
    }

    let out_dir = tmp.path().join("models");
    let cfg = smoke_config(&root, &out_dir);
    let report = run_train(&cfg).unwrap();

    assert_eq!(report.epochs.len(), 2);
    assert!(report.checkpoint_path.exists());
    assert!(report.best_dice.is_finite());
    assert!((0.0..=1.0).contains(&report.best_dice));
    // The first epoch always improves on the initial -inf best.
    assert!(report.epochs[0].saved);
    // A checkpoint is written exactly when val dice strictly improves.
    let mut best = f64::NEG_INFINITY;
    for stats in &report.epochs {
        assert_eq!(stats.saved, stats.val_dice > best);
        if stats.saved {
            best = stats.val_dice;
        }
        assert!(stats.train_loss.is_finite());
        assert!((0.0..=1.0).contains(&stats.val_dice));
        assert!((0.0..=1.0).contains(&stats.val_iou));
        assert!(stats.val_iou <= stats.val_dice + 1e-9);
    }
    assert!((report.best_dice - best).abs() < 1e-12);

    let eval = evaluate(&report.checkpoint_path, &images, &masks).unwrap();
    assert_eq!(eval.samples, 5);
    assert!((0.0..=1.0).contains(&eval.dice));
    assert!((0.0..=1.0).contains(&eval.iou));
    assert!(eval.iou <= eval.dice + 1e-9);
}

#[test]
fn unknown_encoder_is_rejected_up_front() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = smoke_config(&tmp.path().join("data"), &tmp.path().join("models"));
    cfg.model.encoder = "mobilenet".to_string();
    let err = run_train(&cfg).unwrap_err();
    assert!(err.to_string().contains("unknown encoder"));
}

#[test]
fn indivisible_image_size_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = smoke_config(&tmp.path().join("data"), &tmp.path().join("models"));
    // The tiny encoder downsamples twice, so 30 is not reachable.
    cfg.data.img_size = [30, 32];
    let err = run_train(&cfg).unwrap_err();
    assert!(err.to_string().contains("divisible"));
}
