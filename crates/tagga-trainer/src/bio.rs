//! # BIO Tags for Named Entity Recognition
//!
//! Maps entity labels onto the BIO (Begin-Inside-Outside) tag space used by
//! the CRF model, converts gold spans into token tags and decodes predicted
//! tags back into spans.
//!
//! Tag indices are stable as labels are added: `O` is 0, and the `k`-th
//! label owns `B` at `1 + 2k` and `I` at `2 + 2k`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tagga_core::EntitySpan;
use tracing::warn;

use crate::tokenizer::Token;

/// A BIO tag over a label index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BioTag {
    Begin(usize),
    Inside(usize),
    Outside,
}

impl BioTag {
    /// Get the tag index for weight lookups.
    pub fn index(&self) -> usize {
        match self {
            BioTag::Outside => 0,
            BioTag::Begin(label) => 1 + 2 * label,
            BioTag::Inside(label) => 2 + 2 * label,
        }
    }

    /// Get tag from index.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => BioTag::Outside,
            i if i % 2 == 1 => BioTag::Begin((i - 1) / 2),
            i => BioTag::Inside((i - 2) / 2),
        }
    }

    /// The label index this tag belongs to.
    pub fn label(&self) -> Option<usize> {
        match self {
            BioTag::Begin(label) | BioTag::Inside(label) => Some(*label),
            BioTag::Outside => None,
        }
    }

    /// `I-X` may only follow `B-X` or `I-X`.
    pub fn is_valid_transition(from: BioTag, to: BioTag) -> bool {
        match to {
            BioTag::Inside(label) => from.label() == Some(label),
            _ => true,
        }
    }

    /// A sequence cannot open with an `I-X` tag.
    pub fn can_start(&self) -> bool {
        !matches!(self, BioTag::Inside(_))
    }
}

/// The label set of a model and its BIO tag space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BioScheme {
    labels: Vec<String>,
}

impl BioScheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `label`; returns `false` if it was already known.
    pub fn add_label(&mut self, label: &str) -> bool {
        if self.label_index(label).is_some() {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Total number of distinct tags.
    pub fn num_tags(&self) -> usize {
        1 + 2 * self.labels.len()
    }

    /// Display name of a tag, e.g. `B-SKILL`.
    pub fn tag_name(&self, tag: BioTag) -> String {
        match tag {
            BioTag::Outside => "O".to_string(),
            BioTag::Begin(label) => format!("B-{}", self.labels[label]),
            BioTag::Inside(label) => format!("I-{}", self.labels[label]),
        }
    }

    /// Matrix of allowed `[from][to]` transitions.
    pub fn transition_mask(&self) -> Vec<Vec<bool>> {
        let n = self.num_tags();
        (0..n)
            .map(|from| {
                (0..n)
                    .map(|to| {
                        BioTag::is_valid_transition(BioTag::from_index(from), BioTag::from_index(to))
                    })
                    .collect()
            })
            .collect()
    }

    /// Tag indices for `tokens` given gold `spans`.
    ///
    /// A token is inside a span only if it lies entirely within it. Spans
    /// that cover no whole token, use an unknown label or overlap an earlier
    /// span are skipped with a warning.
    pub fn encode(&self, tokens: &[Token], spans: &[EntitySpan]) -> Vec<usize> {
        let mut tags = vec![BioTag::Outside.index(); tokens.len()];
        let mut sorted: Vec<&EntitySpan> = spans.iter().collect();
        sorted.sort();

        for span in sorted {
            let Some(label) = self.label_index(&span.label) else {
                warn!(%span, "skipping span with unregistered label");
                continue;
            };
            let covered: Vec<usize> = tokens
                .iter()
                .filter(|t| t.start >= span.start && t.end <= span.end)
                .map(|t| t.index)
                .collect();
            if covered.is_empty() {
                warn!(%span, "skipping span that covers no token");
                continue;
            }
            if covered.iter().any(|&i| tags[i] != BioTag::Outside.index()) {
                warn!(%span, "skipping overlapping span");
                continue;
            }
            for (n, &i) in covered.iter().enumerate() {
                let tag = if n == 0 {
                    BioTag::Begin(label)
                } else {
                    BioTag::Inside(label)
                };
                tags[i] = tag.index();
            }
        }

        tags
    }

    /// Char spans described by a tag sequence over `tokens`.
    ///
    /// A stray `I-X` without a preceding `B-X` opens a new entity.
    pub fn decode(&self, tokens: &[Token], tags: &[usize]) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut open: Option<(usize, usize, usize)> = None;

        for (token, &idx) in tokens.iter().zip(tags) {
            let tag = BioTag::from_index(idx);
            match (tag, open) {
                (BioTag::Inside(label), Some((l, start, _))) if l == label => {
                    open = Some((l, start, token.end));
                }
                (BioTag::Begin(label), _) | (BioTag::Inside(label), _) => {
                    if let Some(done) = open.take() {
                        spans.push(self.span(done));
                    }
                    open = Some((label, token.start, token.end));
                }
                (BioTag::Outside, _) => {
                    if let Some(done) = open.take() {
                        spans.push(self.span(done));
                    }
                }
            }
        }
        if let Some(done) = open {
            spans.push(self.span(done));
        }

        spans
    }

    fn span(&self, (label, start, end): (usize, usize, usize)) -> EntitySpan {
        EntitySpan::new(start, end, self.labels[label].clone())
    }
}

impl fmt::Display for BioScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = (0..self.num_tags())
            .map(|i| self.tag_name(BioTag::from_index(i)))
            .collect();
        write!(f, "{}", names.join(" "))
    }
}
