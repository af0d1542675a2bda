//! # Tagga Trainer
//!
//! Turns annotated text into a named-entity recognizer. Includes the
//! Dataturks export converter, a BIO-tagged CRF model decoded with
//! constrained Viterbi, and the training/evaluation loop.
//!
//! ```rust
//! use tagga_trainer::{CrfModel, Trainer};
//!
//! let trainer = Trainer::<CrfModel>::new(None, &["SKILL"]).unwrap();
//! assert!(trainer.predict("Rust developer").is_empty());
//! ```

pub mod batch;
pub mod bio;
pub mod convert;
pub mod data;
pub mod error;
pub mod model;
pub mod run;
pub mod tokenizer;
pub mod trainer;
pub mod viterbi;

pub use bio::{BioScheme, BioTag};
pub use convert::{convert, normalize_labels, try_convert};
pub use data::{load_examples, save_examples};
pub use error::{ConvertError, Result, TrainerError};
pub use model::{CrfModel, NerModel};
pub use run::{TrainingRun, run_training};
pub use trainer::{Trainer, recall};
