pub mod example;
pub mod span;

pub use example::TrainingExample;
pub use span::{Annotation, EntityKey, EntitySpan};
