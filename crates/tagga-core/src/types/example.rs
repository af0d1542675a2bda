use serde::{Deserialize, Serialize};

use super::span::EntitySpan;

/// A text together with its gold entity spans, the unit consumed by training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub entities: Vec<EntitySpan>,
}

impl TrainingExample {
    #[must_use]
    pub fn new(text: impl Into<String>, entities: Vec<EntitySpan>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }

    /// The `(covered text, label)` pairs of the gold entities.
    ///
    /// Offsets are clamped to the text, so a span running past the end
    /// covers what is left of it and every entity yields one pair.
    #[must_use]
    pub fn gold_pairs(&self) -> Vec<(String, String)> {
        let chars: Vec<char> = self.text.chars().collect();
        self.entities
            .iter()
            .map(|span| {
                let end = span.end.min(chars.len());
                let start = span.start.min(end);
                (chars[start..end].iter().collect(), span.label.clone())
            })
            .collect()
    }
}
