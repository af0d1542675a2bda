//! # Tagga
//!
//! Named-entity annotation toolkit. Re-exports the annotation data model
//! from [`tagga_core`] and the converter and trainer from [`tagga_trainer`].

pub use tagga_core::*;
pub use tagga_trainer::{
    self as trainer, BioScheme, ConvertError, CrfModel, NerModel, Trainer, TrainerError,
    TrainingRun, convert, load_examples, normalize_labels, recall, run_training, save_examples,
    try_convert,
};
