use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while editing or persisting annotation projects.
#[derive(Debug, Error)]
pub enum TaggaError {
    /// An import record lacks the configured text field.
    #[error("record is missing text field {field:?}")]
    MissingField {
        /// The field name that was expected.
        field: String,
    },

    /// An entity, vocabulary entry or document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A span does not satisfy `start < end <= len(text)`.
    #[error("invalid span {start}..{end} for text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// The import file is not a non-empty JSON array of records.
    #[error("invalid import: {0}")]
    InvalidImport(String),

    /// A project file could not be decoded.
    #[error("corrupt project file {path:?}: {source}")]
    CorruptProject {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A session command needs a project but none is open.
    #[error("no project is open")]
    NoActiveProject,

    /// A session command needs a selected document but none is selected.
    #[error("no document is selected")]
    NoDocumentSelected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Tagga core operations.
pub type Result<T> = std::result::Result<T, TaggaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = TaggaError::MissingField {
            field: "content".into(),
        };
        assert_eq!(err.to_string(), "record is missing text field \"content\"");

        let err = TaggaError::InvalidSpan {
            start: 4,
            end: 2,
            len: 10,
        };
        assert!(err.to_string().contains("4..2"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TaggaError>();
    }
}
