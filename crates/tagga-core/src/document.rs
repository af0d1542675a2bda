//! # Documents
//!
//! A document owns its normalized text and the entity annotations placed on
//! it. Annotations are keyed by [`EntityKey`], so adding the same span twice
//! keeps a single entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TaggaError};
use crate::types::{Annotation, EntityKey, EntitySpan};

/// Separator placed between the lines of a normalized text.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Import record field holding pre-existing entities.
const ENTITIES_FIELD: &str = "entities";

/// Import record field holding the document id.
const ID_FIELD: &str = "id";

/// A text document and its entity annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    text: String,
    entities: BTreeMap<EntityKey, Annotation>,
}

/// Entities as they may appear in an import record.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportedEntities {
    Keyed(BTreeMap<String, ImportedEntity>),
    Listed(Vec<ImportedEntity>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportedEntity {
    Object {
        start: usize,
        end: usize,
        label: String,
    },
    WithText(usize, usize, String, String),
    Triple(usize, usize, String),
}

impl ImportedEntity {
    fn into_span(self) -> EntitySpan {
        match self {
            ImportedEntity::Object { start, end, label }
            | ImportedEntity::WithText(start, end, label, _)
            | ImportedEntity::Triple(start, end, label) => EntitySpan::new(start, end, label),
        }
    }
}

impl Document {
    /// Creates a document with a fresh id and no entities.
    pub fn new(text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: normalize_text(text),
            entities: BTreeMap::new(),
        }
    }

    /// Builds a document from an import record.
    ///
    /// The text is read from `text_field` and normalized. Entities are taken
    /// from the record's `entities` field when present, either as a keyed map
    /// of annotations or as a list of `[start, end, label]` spans. The id is
    /// taken from the record's `id` field, or freshly generated.
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::MissingField`] if `text_field` is absent or not a
    /// string, [`TaggaError::InvalidImport`] if `entities` is malformed and
    /// [`TaggaError::InvalidSpan`] if an imported entity lies outside the text.
    pub fn from_record(record: &Value, text_field: &str) -> Result<Self> {
        let missing = || TaggaError::MissingField {
            field: text_field.to_string(),
        };
        let object = record.as_object().ok_or_else(missing)?;
        let raw_text = object
            .get(text_field)
            .and_then(Value::as_str)
            .ok_or_else(missing)?;

        let id = match object.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let mut doc = Self {
            id,
            text: normalize_text(raw_text),
            entities: BTreeMap::new(),
        };

        match object.get(ENTITIES_FIELD) {
            None | Some(Value::Null) => {}
            Some(raw) => {
                let imported = ImportedEntities::deserialize(raw).map_err(|e| {
                    TaggaError::InvalidImport(format!(
                        "entities of document {}: {e}",
                        doc.id
                    ))
                })?;
                let spans: Vec<EntitySpan> = match imported {
                    ImportedEntities::Keyed(map) => {
                        map.into_values().map(ImportedEntity::into_span).collect()
                    }
                    ImportedEntities::Listed(list) => {
                        list.into_iter().map(ImportedEntity::into_span).collect()
                    }
                };
                for span in spans {
                    doc.add_entity(span.start, span.end, &span.label)?;
                }
            }
        }

        Ok(doc)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The text covered by the char range `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start > end {
            return None;
        }
        let byte_start = self.byte_offset(start)?;
        let byte_end = self.byte_offset(end)?;
        Some(&self.text[byte_start..byte_end])
    }

    fn byte_offset(&self, char_idx: usize) -> Option<usize> {
        self.text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(self.text.len()))
            .nth(char_idx)
    }

    /// Adds an annotation for `start..end` with `label`.
    ///
    /// Adding an existing key overwrites it with an identical value.
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::InvalidSpan`] unless `start < end <= len(text)`.
    pub fn add_entity(&mut self, start: usize, end: usize, label: &str) -> Result<&Annotation> {
        let invalid = || TaggaError::InvalidSpan {
            start,
            end,
            len: self.char_len(),
        };
        if start >= end {
            return Err(invalid());
        }
        let text = self.slice(start, end).ok_or_else(invalid)?.to_string();

        let annotation = Annotation {
            start,
            end,
            label: label.to_string(),
            text,
        };
        debug!(doc = %self.id, %annotation, "added entity");

        let key = annotation.key();
        self.entities.insert(key.clone(), annotation);
        Ok(&self.entities[&key])
    }

    /// Removes the annotation for `start..end` with `label`.
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::NotFound`] if no such annotation exists.
    pub fn remove_entity(&mut self, start: usize, end: usize, label: &str) -> Result<Annotation> {
        let key = EntityKey::new(start, end, label);
        let removed = self
            .entities
            .remove(&key)
            .ok_or_else(|| TaggaError::NotFound(format!("entity {key} in document {}", self.id)))?;
        debug!(doc = %self.id, annotation = %removed, "removed entity");
        Ok(removed)
    }

    pub fn contains_key(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// Annotations in key order.
    pub fn entities(&self) -> impl Iterator<Item = &Annotation> {
        self.entities.values()
    }

    /// Annotations ordered by position, then label.
    pub fn annotations_by_position(&self) -> Vec<&Annotation> {
        let mut annotations: Vec<&Annotation> = self.entities.values().collect();
        annotations.sort_by(|a, b| {
            (a.start, a.end, &a.label).cmp(&(b.start, b.end, &b.label))
        });
        annotations
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The first `words` whitespace-separated words, used to label document lists.
    pub fn preview(&self, words: usize) -> String {
        self.text
            .split_whitespace()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalizes document text: each line is trimmed, blank lines are dropped
/// and the remaining lines are joined with [`LINE_SEPARATOR`].
pub fn normalize_text(raw: &str) -> String {
    raw.split(is_line_break)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}
