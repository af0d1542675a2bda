use std::fmt;

use serde::{Deserialize, Serialize};

/// A labeled half-open `[start, end)` range of char offsets into a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntitySpan {
    /// First char of the span.
    pub start: usize,
    /// One past the last char of the span.
    pub end: usize,
    /// Entity label, e.g. `SKILL`.
    pub label: String,
}

impl EntitySpan {
    /// Creates a new span.
    #[must_use]
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// The canonical key identifying this span within a document.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.start, self.end, &self.label)
    }

    /// Number of chars covered by the span.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the span covers no chars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both spans share at least one char.
    #[must_use]
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for EntitySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} {}", self.start, self.end, self.label)
    }
}

/// Deterministic identifier of an annotation: `"{start}_{end}_{label}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    #[must_use]
    pub fn new(start: usize, end: usize, label: &str) -> Self {
        Self(format!("{start}_{end}_{label}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entity stored in a document, together with the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub label: String,
    /// The document text in `start..end` at the time of annotation.
    pub text: String,
}

impl Annotation {
    /// The span this annotation covers.
    #[must_use]
    pub fn span(&self) -> EntitySpan {
        EntitySpan::new(self.start, self.end, self.label.clone())
    }

    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.start, self.end, &self.label)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} {} {:?}",
            self.start, self.end, self.label, self.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let a = EntitySpan::new(3, 9, "SKILL");
        let b = EntitySpan::new(3, 9, "SKILL");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().as_str(), "3_9_SKILL");
    }

    #[test]
    fn key_distinguishes_labels() {
        let a = EntitySpan::new(3, 9, "SKILL");
        let b = EntitySpan::new(3, 9, "activity");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn overlap_is_half_open() {
        let a = EntitySpan::new(0, 5, "X");
        assert!(a.overlaps(&EntitySpan::new(4, 8, "X")));
        assert!(!a.overlaps(&EntitySpan::new(5, 8, "X")));
    }

    #[test]
    fn annotation_key_matches_span_key() {
        let ann = Annotation {
            start: 1,
            end: 4,
            label: "SKILL".into(),
            text: "Rus".into(),
        };
        assert_eq!(ann.key(), ann.span().key());
        assert_eq!(ann.to_string(), "1..4 SKILL \"Rus\"");
    }

    #[test]
    fn key_serializes_as_plain_string() {
        let key = EntityKey::new(0, 2, "SKILL");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"0_2_SKILL\"");
    }
}
