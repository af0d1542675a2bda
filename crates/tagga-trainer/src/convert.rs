//! # Dataturks Export Conversion
//!
//! Turns a Dataturks NER export (one JSON record per line) into training
//! examples. Dataturks stores closed `[start, end]` intervals; examples use
//! half-open `[start, end)` ranges, so every end offset is shifted by one
//! here and nowhere else.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tagga_core::{EntitySpan, TrainingExample};
use tracing::{debug, error};

use crate::error::ConvertError;

#[derive(Debug, Deserialize)]
struct DataturksRecord {
    content: String,
    #[serde(default)]
    annotation: Option<Vec<DataturksAnnotation>>,
}

#[derive(Debug, Deserialize)]
struct DataturksAnnotation {
    points: Vec<DataturksPoint>,
    label: DataturksLabel,
}

#[derive(Debug, Deserialize)]
struct DataturksPoint {
    start: usize,
    end: usize,
}

/// A single label or a list of labels sharing one interval.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataturksLabel {
    One(String),
    Many(Vec<String>),
}

impl DataturksLabel {
    fn into_vec(self) -> Vec<String> {
        match self {
            DataturksLabel::One(label) => vec![label],
            DataturksLabel::Many(labels) => labels,
        }
    }
}

/// Converts a Dataturks export into training examples.
///
/// Records without annotations are skipped. Any failure is logged and
/// yields an empty vector, so an empty result means the conversion failed
/// rather than that the file held no entities. Use [`try_convert`] to get
/// the error instead.
pub fn convert(path: &Path) -> Vec<TrainingExample> {
    match try_convert(path) {
        Ok(examples) => examples,
        Err(e) => {
            error!(path = %path.display(), error = %e, "unable to process annotation export");
            Vec::new()
        }
    }
}

/// Strict variant of [`convert`].
///
/// # Errors
///
/// Returns [`ConvertError`] if the file cannot be read, a line is not a
/// valid record or an annotation has no points.
pub fn try_convert(path: &Path) -> Result<Vec<TrainingExample>, ConvertError> {
    let raw = fs::read_to_string(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut examples = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: DataturksRecord =
            serde_json::from_str(line).map_err(|source| ConvertError::Json {
                line: line_no,
                source,
            })?;
        let Some(annotations) = record.annotation else {
            debug!(line = line_no, "skipping record without annotation");
            continue;
        };

        let mut entities = Vec::new();
        for annotation in annotations {
            // Only the first point of an annotation is used.
            let point = annotation
                .points
                .first()
                .ok_or_else(|| ConvertError::Malformed {
                    line: line_no,
                    reason: "annotation without points".into(),
                })?;
            let end = point.end.checked_add(1).ok_or_else(|| ConvertError::Malformed {
                line: line_no,
                reason: format!("end offset {} out of range", point.end),
            })?;
            for label in annotation.label.into_vec() {
                entities.push(EntitySpan::new(point.start, end, label));
            }
        }

        examples.push(TrainingExample::new(record.content, entities));
    }

    Ok(examples)
}

/// Uppercases every label and replaces spaces with underscores, in place.
///
/// Returns the resulting label set.
pub fn normalize_labels(examples: &mut [TrainingExample]) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    for example in examples.iter_mut() {
        for span in &mut example.entities {
            span.label = span.label.to_uppercase().replace(' ', "_");
            labels.insert(span.label.clone());
        }
    }
    labels
}
