//! # Vocabulary Autotagging
//!
//! The vocabulary is the set of `(literal text, label)` pairs the user has
//! confirmed. Every literal occurrence of a vocabulary entry in a document
//! is proposed as a new annotation.
//!
//! Forgetting an entry is global: it stops being proposed for every
//! document of the owning project, not just the one it was removed from.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{Result, TaggaError};
use crate::types::EntitySpan;

/// A confirmed `(literal text, label)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VocabEntry {
    pub text: String,
    pub label: String,
}

impl VocabEntry {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }

    /// Matcher for the literal text. Regex metacharacters match themselves.
    fn matcher(&self) -> std::result::Result<Regex, regex::Error> {
        Regex::new(&regex::escape(&self.text))
    }
}

/// The set of confirmed entries shared by all documents of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    entries: BTreeSet<VocabEntry>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `(text, label)`. Returns `false` if it was already present or the
    /// text is blank.
    pub fn learn(&mut self, text: &str, label: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let inserted = self.entries.insert(VocabEntry::new(text, label));
        if inserted {
            debug!(text, label, "learned vocabulary entry");
        }
        inserted
    }

    /// Removes `(text, label)` from the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::NotFound`] if the entry is absent.
    pub fn forget(&mut self, text: &str, label: &str) -> Result<()> {
        if !self.entries.remove(&VocabEntry::new(text, label)) {
            return Err(TaggaError::NotFound(format!(
                "vocabulary entry ({text:?}, {label})"
            )));
        }
        debug!(text, label, "forgot vocabulary entry");
        Ok(())
    }

    pub fn contains(&self, text: &str, label: &str) -> bool {
        self.entries.contains(&VocabEntry::new(text, label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabEntry> {
        self.entries.iter()
    }

    /// Proposes a span for every non-overlapping literal occurrence of every
    /// entry in `doc`, skipping spans whose key the document already has.
    ///
    /// The document is not modified.
    pub fn propose(&self, doc: &Document) -> Vec<EntitySpan> {
        let text = doc.text();
        let mut proposals = Vec::new();

        for entry in &self.entries {
            let matcher = match entry.matcher() {
                Ok(re) => re,
                Err(e) => {
                    warn!(text = %entry.text, error = %e, "skipping unmatchable vocabulary entry");
                    continue;
                }
            };

            let mut offsets = CharOffsets::new(text);
            for m in matcher.find_iter(text) {
                let start = offsets.char_offset(m.start());
                let end = offsets.char_offset(m.end());
                let span = EntitySpan::new(start, end, entry.label.clone());
                if !doc.contains_key(&span.key()) {
                    proposals.push(span);
                }
            }
        }

        proposals
    }

    /// Applies every proposal to `doc` and returns how many were added.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Document::add_entity`].
    pub fn autotag(&self, doc: &mut Document) -> Result<usize> {
        let proposals = self.propose(doc);
        for span in &proposals {
            doc.add_entity(span.start, span.end, &span.label)?;
        }
        debug!(doc = doc.id(), added = proposals.len(), "autotagged document");
        Ok(proposals.len())
    }
}

/// Converts ascending byte offsets of one string into char offsets.
struct CharOffsets<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharOffsets<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// `byte` must be a char boundary not smaller than the previous call's.
    fn char_offset(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.chars = 0;
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
