use std::path::PathBuf;

use clap::Parser;
use tagga_trainer::run::default_output;
use tagga_trainer::{TrainingRun, run_training};
use tracing_subscriber::EnvFilter;

/// Train an entity recognizer on a Dataturks NDJSON export.
#[derive(Parser, Debug)]
#[command(name = "train", version)]
struct Args {
    /// Dataturks export, one JSON record per line.
    input: PathBuf,

    #[arg(long, default_value_t = 200)]
    train_size: usize,

    #[arg(long, default_value_t = 20)]
    test_size: usize,

    #[arg(long, default_value_t = 5)]
    iterations: usize,

    /// Model directory [default: models/<input stem>]
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Seed for shuffling and dropout.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let output = args.output.unwrap_or_else(|| default_output(&args.input));
    let run = TrainingRun {
        input: args.input,
        train_size: args.train_size,
        test_size: args.test_size,
        iterations: args.iterations,
        output: Some(output),
        seed: args.seed,
    };

    match run_training(&run) {
        Ok(score) => println!("Score: {score:.3}"),
        Err(e) => {
            eprintln!("Training failed: {e:#}");
            std::process::exit(1);
        }
    }
}
