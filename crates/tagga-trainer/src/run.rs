//! End-to-end training run over a Dataturks export.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use oorandom::Rand32;
use tagga_core::TrainingExample;
use tracing::{info, warn};

use crate::convert::{convert, normalize_labels};
use crate::model::CrfModel;
use crate::trainer::{Trainer, clock_seed, shuffle};

/// Options of a training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub input: PathBuf,
    pub train_size: usize,
    pub test_size: usize,
    pub iterations: usize,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl TrainingRun {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            train_size: 200,
            test_size: 20,
            iterations: 5,
            output: None,
            seed: None,
        }
    }
}

/// Converts the export, trains a fresh CRF model on the head of the shuffled
/// data and scores it on the tail. Returns the evaluation score.
pub fn run_training(run: &TrainingRun) -> anyhow::Result<f64> {
    let mut examples = convert(&run.input);
    if examples.is_empty() {
        bail!("No training examples in {}", run.input.display());
    }
    let labels = normalize_labels(&mut examples);
    info!(
        "Loaded {} examples with {} labels from {}",
        examples.len(),
        labels.len(),
        run.input.display()
    );

    let labels: Vec<String> = labels.into_iter().collect();
    let seed = run.seed.unwrap_or_else(clock_seed);
    let mut trainer = Trainer::<CrfModel>::new(None, &labels)?.with_seed(seed);
    shuffle(&mut examples, &mut Rand32::new(seed));

    let (mut train, test) = split(&examples, run.train_size, run.test_size);
    info!("Training on {} examples", train.len());
    trainer.train(&mut train, run.iterations)?;

    let score = evaluate_split(&trainer, &test)?;
    info!("Evaluation score: {:.3}", score);

    if let Some(dir) = &run.output {
        trainer
            .persist(dir)
            .with_context(|| format!("Failed to save model to {}", dir.display()))?;
    }

    Ok(score)
}

fn evaluate_split(trainer: &Trainer<CrfModel>, test: &[TrainingExample]) -> anyhow::Result<f64> {
    let scorable: Vec<TrainingExample> = test
        .iter()
        .filter(|e| !e.entities.is_empty())
        .cloned()
        .collect();
    if scorable.len() < test.len() {
        warn!(
            "Skipping {} test examples without entities",
            test.len() - scorable.len()
        );
    }
    Ok(trainer.evaluate(&scorable)?)
}

/// The first `train_size` examples and the last `test_size` in reverse order.
fn split(
    examples: &[TrainingExample],
    train_size: usize,
    test_size: usize,
) -> (Vec<TrainingExample>, Vec<TrainingExample>) {
    let train = examples.iter().take(train_size).cloned().collect();
    let test = examples.iter().rev().take(test_size).cloned().collect();
    (train, test)
}

/// Default output directory for a model trained from `input`.
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "model".into(), |s| s.to_string_lossy().into_owned());
    PathBuf::from("models").join(stem)
}
