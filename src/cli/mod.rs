// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, built on clap.
// All pipeline logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `prepare` - builds the train/test tensors and the model
//   2. `inspect` - summarises previously written artifacts

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, PrepareArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cub-caption-prep",
    version = "0.1.0",
    about = "Turn CUB bird captions into padded, embedded tensors for downstream training."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    tracing::info!("Preparing CUB captions from: {}", args.data_root);

    let summary = PrepareUseCase::new(args.into()).execute()?;

    println!("Preprocessing complete. Artifacts in '{}'", summary.output_dir.display());
    println!("  train tensor : {:?}", summary.train_shape);
    println!("  test tensor  : {:?}", summary.test_shape);
    println!("  rare words   : {}", summary.rare_words);
    println!("  vocabulary   : {}", summary.vocab_size);
    println!(
        "  stats        : min={:.4} max={:.4} mean={:.4} std={:.4}",
        summary.stats.min, summary.stats.max, summary.stats.mean, summary.stats.std
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(args.data_root, args.model_name).execute()?;

    for a in &report.artifacts {
        println!(
            "{:<5} {:?}  min={:.4} max={:.4} mean={:.4} std={:.4}",
            a.split, a.shape, a.stats.min, a.stats.max, a.stats.mean, a.stats.std
        );
    }
    if !report.stats_consistent {
        println!("warning: train and test statistics differ");
    }

    if let Some(cfg) = &report.config {
        println!(
            "config: min_count={} seq_len={} emb_size={} epochs={} use_fixed={}",
            cfg.min_count, cfg.seq_len, cfg.emb_size, cfg.epochs, cfg.use_fixed
        );
    }

    let m = &report.model;
    println!(
        "model: {} words, dim={}, buckets={}, {:?}, oov={:?}",
        m.vocab_size, m.embedding_size, m.bucket_count, m.architecture, m.oov_policy
    );
    let top: Vec<String> = m.top_words.iter().map(|(w, c)| format!("{w}({c})")).collect();
    println!("top words: {}", top.join(" "));
    Ok(())
}
