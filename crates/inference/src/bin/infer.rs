use clap::Parser;
use inference::run_inference;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "infer",
    about = "Predict segmentation masks and overlays for a directory of images"
)]
struct Args {
    /// Directory of input images.
    #[arg(long)]
    images: PathBuf,
    /// Checkpoint produced by training.
    #[arg(long)]
    checkpoint: PathBuf,
    /// Output directory for {stem}_mask.png / {stem}_overlay.png files.
    #[arg(long, default_value = "out_preds")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let summary = run_inference(&args.checkpoint, &args.images, &args.out)?;
    println!(
        "Wrote {} prediction pairs to {} ({} skipped)",
        summary.written,
        args.out.display(),
        summary.skipped
    );
    Ok(())
}
