//! Training loop, evaluation and persistence.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use oorandom::Rand32;
use tagga_core::{Annotation, TrainingExample};
use tracing::{debug, info};

use crate::batch::{Compounding, minibatches};
use crate::error::{Result, TrainerError};
use crate::model::{CrfModel, NerModel};

/// Feature dropout applied during training updates.
pub const DROPOUT: f32 = 0.5;

pub struct Trainer<M: NerModel = CrfModel> {
    model: M,
    rng: Rand32,
}

impl<M: NerModel + Default> Trainer<M> {
    /// Loads the model in `model_dir` if given, otherwise starts from a blank
    /// model. `labels` are registered either way.
    pub fn new<S: AsRef<str>>(model_dir: Option<&Path>, labels: &[S]) -> Result<Self> {
        let mut model = match model_dir {
            Some(dir) => {
                info!("Loading model from {}", dir.display());
                M::load(dir)?
            }
            None => M::default(),
        };
        for label in labels {
            model.add_label(label.as_ref());
        }
        Ok(Self::from_model(model))
    }
}

impl<M: NerModel> Trainer<M> {
    pub fn from_model(model: M) -> Self {
        Self {
            model,
            rng: Rand32::new(clock_seed()),
        }
    }

    /// Makes shuffling and dropout reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rand32::new(seed);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Trains for `iterations` passes over `examples`, shuffling them in place
    /// before each pass. Returns the summed loss of every pass.
    pub fn train(&mut self, examples: &mut [TrainingExample], iterations: usize) -> Result<Vec<f32>> {
        if examples.is_empty() {
            return Err(TrainerError::NoExamples);
        }
        for example in examples.iter() {
            for span in &example.entities {
                self.model.add_label(&span.label);
            }
        }

        let mut losses = Vec::with_capacity(iterations);
        for iteration in 0..iterations {
            shuffle(examples, &mut self.rng);

            let mut loss = 0.0;
            let mut sizes = Compounding::default();
            for batch in minibatches(examples, &mut sizes) {
                loss += self.model.update(batch, DROPOUT, &mut self.rng);
            }
            info!(
                "Iteration {}/{} - loss: {:.1}",
                iteration + 1,
                iterations,
                loss
            );
            losses.push(loss);
        }

        Ok(losses)
    }

    /// Mean per-example recall of the gold `(text, label)` pairs.
    pub fn evaluate(&self, examples: &[TrainingExample]) -> Result<f64> {
        if examples.is_empty() {
            return Err(TrainerError::NoExamples);
        }

        let mut total = 0.0;
        for (index, example) in examples.iter().enumerate() {
            let truth = example.gold_pairs();
            let predicted: Vec<(String, String)> = self
                .model
                .predict(&example.text)
                .into_iter()
                .map(|a| (a.text, a.label))
                .collect();
            let score =
                recall(&truth, &predicted).ok_or(TrainerError::EmptyGroundTruth { index })?;
            debug!("Example #{index}: recall {score:.2}");
            total += score;
        }

        Ok(total / examples.len() as f64)
    }

    pub fn predict(&self, text: &str) -> Vec<Annotation> {
        self.model.predict(text)
    }

    /// Writes the model into `dir`, creating it if needed.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.model.save(dir)?;
        info!("Model saved to {}", dir.display());
        Ok(())
    }

    /// Replaces the current model with the one stored in `dir`.
    pub fn load(&mut self, dir: &Path) -> Result<()> {
        self.model = M::load(dir)?;
        Ok(())
    }
}

/// Fraction of `truth` found in `predicted`; `None` when `truth` is empty.
pub fn recall(truth: &[(String, String)], predicted: &[(String, String)]) -> Option<f64> {
    if truth.is_empty() {
        return None;
    }
    let found = truth.iter().filter(|pair| predicted.contains(pair)).count();
    Some(found as f64 / truth.len() as f64)
}

/// Fisher-Yates shuffle.
pub(crate) fn shuffle<T>(items: &mut [T], rng: &mut Rand32) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_range(0..(i as u32 + 1)) as usize;
        items.swap(i, j);
    }
}

pub(crate) fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
