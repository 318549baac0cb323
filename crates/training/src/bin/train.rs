use clap::Parser;
use contracts::RunConfig;
use std::path::PathBuf;
use training::run_train;

#[derive(Parser, Debug)]
#[command(
    name = "train",
    about = "Train the segmentation model, keeping the best validation checkpoint"
)]
struct Args {
    /// Run configuration (TOML). Fields omitted from the file use built-in
    /// defaults.
    #[arg(long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = RunConfig::load(&args.config)?;

    if config.train.num_workers > 0 {
        // Sizes the decode pool; a failure here just means a pool was
        // already installed.
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.train.num_workers)
            .build_global()
            .ok();
    }

    let report = run_train(&config)?;
    println!(
        "Training complete: best val dice {:.4} over {} epochs",
        report.best_dice,
        report.epochs.len()
    );
    println!("Checkpoint: {}", report.checkpoint_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_argument_is_required() {
        assert!(Args::try_parse_from(["train"]).is_err());
        let args = Args::try_parse_from(["train", "--config", "run.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("run.toml"));
    }
}
