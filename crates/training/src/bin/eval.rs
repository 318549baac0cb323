use clap::Parser;
use std::path::PathBuf;
use training::evaluate;

#[derive(Parser, Debug)]
#[command(
    name = "eval",
    about = "Score a segmentation checkpoint on a labeled image/mask directory pair"
)]
struct Args {
    /// Checkpoint produced by training.
    #[arg(long)]
    checkpoint: PathBuf,
    /// Directory of input images.
    #[arg(long, default_value = "data/images")]
    images: PathBuf,
    /// Directory of ground-truth masks.
    #[arg(long, default_value = "data/masks")]
    masks: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let report = evaluate(&args.checkpoint, &args.images, &args.masks)?;
    println!(
        "Dice: {:.4} | IoU: {:.4} ({} samples)",
        report.dice, report.iou, report.samples
    );
    Ok(())
}
