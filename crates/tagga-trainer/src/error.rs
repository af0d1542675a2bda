use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while training, evaluating or persisting a model.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Recall is undefined for an example without gold entities.
    #[error("example #{index} has no ground-truth entities")]
    EmptyGroundTruth { index: usize },

    #[error("no examples to evaluate")]
    NoExamples,

    /// A model artifact exists but does not describe a usable model.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading an annotation export.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Result type alias for trainer operations.
pub type Result<T> = std::result::Result<T, TrainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = TrainerError::EmptyGroundTruth { index: 3 };
        assert_eq!(err.to_string(), "example #3 has no ground-truth entities");

        let err = ConvertError::Malformed {
            line: 7,
            reason: "annotation without points".into(),
        };
        assert!(err.to_string().starts_with("line 7"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrainerError>();
        assert_send_sync::<ConvertError>();
    }
}
