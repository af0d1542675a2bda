//! # Tagga Core
//!
//! The annotation data model behind Tagga: documents carrying keyed entity
//! spans, a shared vocabulary that proposes new annotations by literal
//! matching, and projects persisted as a single file.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagga_core::{Document, Vocabulary};
//!
//! let mut doc = Document::new("Rust developer who loves Rust");
//! doc.add_entity(0, 4, "SKILL").unwrap();
//!
//! let mut vocab = Vocabulary::new();
//! vocab.learn("Rust", "SKILL");
//!
//! let proposals = vocab.propose(&doc);
//! assert_eq!(proposals.len(), 1);
//! assert_eq!(proposals[0].start, 25);
//! ```
pub mod config;
pub mod document;
pub mod error;
pub mod project;
pub mod session;
pub mod types;
pub mod vocab;

// Re-export primary API
pub use config::{Relief, TagStyle, TaggaConfig};
pub use document::{normalize_text, Document};
pub use error::{Result, TaggaError};
pub use project::Project;
pub use session::{Command, DocumentView, Outcome, Session};
pub use types::{Annotation, EntityKey, EntitySpan, TrainingExample};
pub use vocab::{VocabEntry, Vocabulary};
