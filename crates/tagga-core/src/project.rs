//! # Projects
//!
//! A project is the persisted unit of an annotation session: the ordered
//! documents, the vocabulary they share, the configuration and the creation
//! timestamp. It is saved and loaded as a single JSON file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::TaggaConfig;
use crate::document::Document;
use crate::error::{Result, TaggaError};
use crate::types::{Annotation, TrainingExample};
use crate::vocab::Vocabulary;

/// Format of the creation timestamp, also used in default file names.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H_%M_%S";

/// Documents, their shared vocabulary and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    config: TaggaConfig,
    created: String,
    documents: Vec<Document>,
    vocabulary: Vocabulary,
}

impl Project {
    /// Creates an empty project.
    pub fn new(config: TaggaConfig) -> Self {
        Self {
            config,
            created: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            documents: Vec::new(),
            vocabulary: Vocabulary::new(),
        }
    }

    /// Creates a project with one document per import record.
    ///
    /// # Errors
    ///
    /// Propagates [`Document::from_record`] errors, e.g.
    /// [`TaggaError::MissingField`].
    pub fn from_records(records: &[Value], config: TaggaConfig) -> Result<Self> {
        let mut project = Self::new(config);
        project.documents = records
            .iter()
            .map(|record| Document::from_record(record, &project.config.text_field))
            .collect::<Result<_>>()?;
        Ok(project)
    }

    /// Creates a project from a JSON file holding a non-empty array of records.
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::InvalidImport`] if the file is not a non-empty
    /// JSON array, plus any error of [`Project::from_records`].
    pub fn import_json(path: &Path, config: TaggaConfig) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| TaggaError::InvalidImport(format!("{}: {e}", path.display())))?;
        let records = value.as_array().ok_or_else(|| {
            TaggaError::InvalidImport(format!(
                "{}: expected a JSON array of records",
                path.display()
            ))
        })?;
        if records.is_empty() {
            return Err(TaggaError::InvalidImport(format!(
                "{}: no documents to load",
                path.display()
            )));
        }

        let project = Self::from_records(records, config)?;
        info!(path = %path.display(), documents = project.len(), "imported documents");
        Ok(project)
    }

    /// Writes the whole project to `path`, or to the default location under
    /// the configured home. Missing directories are created.
    ///
    /// Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_path(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), documents = self.len(), "wrote project");
        Ok(path)
    }

    /// Reads a project previously written by [`Project::save`].
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::Io`] if the file cannot be read and
    /// [`TaggaError::CorruptProject`] if it does not hold a project.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let project: Project =
            serde_json::from_str(&raw).map_err(|source| TaggaError::CorruptProject {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), documents = project.len(), "loaded project");
        Ok(project)
    }

    /// Default save location derived from the home directory and timestamp.
    pub fn default_path(&self) -> PathBuf {
        self.config.default_project_path(&self.created)
    }

    pub fn config(&self) -> &TaggaConfig {
        &self.config
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn document_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.documents.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vocabulary_mut(&mut self) -> &mut Vocabulary {
        &mut self.vocabulary
    }

    /// Applies the shared vocabulary to document `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TaggaError::NotFound`] for an unknown index.
    pub fn autotag(&mut self, index: usize) -> Result<usize> {
        let doc = self
            .documents
            .get_mut(index)
            .ok_or_else(|| TaggaError::NotFound(format!("document #{index}")))?;
        self.vocabulary.autotag(doc)
    }

    /// Applies the shared vocabulary to every document.
    pub fn autotag_all(&mut self) -> Result<usize> {
        let mut added = 0;
        for doc in &mut self.documents {
            added += self.vocabulary.autotag(doc)?;
        }
        Ok(added)
    }

    /// Annotates document `index` and learns the covered text as a
    /// vocabulary entry.
    pub fn tag(&mut self, index: usize, start: usize, end: usize, label: &str) -> Result<Annotation> {
        let doc = self
            .documents
            .get_mut(index)
            .ok_or_else(|| TaggaError::NotFound(format!("document #{index}")))?;
        let annotation = doc.add_entity(start, end, label)?.clone();
        self.vocabulary.learn(&annotation.text, label);
        Ok(annotation)
    }

    /// Removes an annotation from document `index` and forgets its text
    /// from the vocabulary, for every document.
    ///
    /// An annotation whose text was never learned is still removed.
    pub fn untag(&mut self, index: usize, start: usize, end: usize, label: &str) -> Result<Annotation> {
        let doc = self
            .documents
            .get_mut(index)
            .ok_or_else(|| TaggaError::NotFound(format!("document #{index}")))?;
        let annotation = doc.remove_entity(start, end, label)?;
        if self.vocabulary.contains(&annotation.text, label) {
            self.vocabulary.forget(&annotation.text, label)?;
        }
        Ok(annotation)
    }

    /// The annotated documents as training examples, skipping documents
    /// without entities.
    pub fn training_examples(&self) -> Vec<TrainingExample> {
        self.documents
            .iter()
            .filter(|doc| doc.entity_count() > 0)
            .map(|doc| {
                let spans = doc
                    .annotations_by_position()
                    .into_iter()
                    .map(Annotation::span)
                    .collect();
                TrainingExample::new(doc.text(), spans)
            })
            .collect()
    }

    /// Every label used by an annotation or vocabulary entry.
    pub fn labels(&self) -> BTreeSet<String> {
        self.documents
            .iter()
            .flat_map(|doc| doc.entities().map(|a| a.label.clone()))
            .chain(self.vocabulary.iter().map(|e| e.label.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::EntitySpan;

    fn records() -> Vec<Value> {
        vec![
            json!({"content": "Teamplayer with Rust\n\nskills", "id": "a"}),
            json!({"content": "Rust and Python developer"}),
        ]
    }

    fn config(home: &Path) -> TaggaConfig {
        TaggaConfig::new().with_home(home)
    }

    #[test]
    fn from_records_builds_documents_in_order() {
        let project = Project::from_records(&records(), TaggaConfig::default()).unwrap();
        assert_eq!(project.len(), 2);
        assert_eq!(project.document(0).unwrap().id(), "a");
        assert_eq!(
            project.document(0).unwrap().text(),
            "Teamplayer with Rust\r\nskills"
        );
        assert!(project.vocabulary().is_empty());
        assert_eq!(project.created().len(), 19);
    }

    #[test]
    fn from_records_propagates_missing_field() {
        let records = vec![json!({"content": "ok"}), json!({"body": "no"})];
        let err = Project::from_records(&records, TaggaConfig::default()).unwrap_err();
        assert!(matches!(err, TaggaError::MissingField { .. }));
    }

    #[test]
    fn from_records_honors_text_field() {
        let records = vec![json!({"body": "custom field"})];
        let project =
            Project::from_records(&records, TaggaConfig::new().with_text_field("body")).unwrap();
        assert_eq!(project.document(0).unwrap().text(), "custom field");
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::from_records(&records(), config(dir.path())).unwrap();
        project.tag(0, 16, 20, "SKILL").unwrap();
        project.vocabulary_mut().learn("Python", "SKILL");
        project.autotag_all().unwrap();

        let path = project.save(None).unwrap();
        let loaded = Project::load(&path).unwrap();

        assert_eq!(loaded, project);
        assert_eq!(loaded.document(1).unwrap().entity_count(), 2);
        assert!(loaded.vocabulary().contains("Rust", "SKILL"));
    }

    #[test]
    fn save_uses_default_path_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("nested").join("home");
        let project = Project::new(config(&home));

        let path = project.save(None).unwrap();
        assert!(path.starts_with(&home));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tagga_project-"));
        assert!(name.ends_with(".tagga"));
        assert!(path.exists());
    }

    #[test]
    fn save_to_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("mine.tagga");
        let project = Project::new(config(dir.path()));
        assert_eq!(project.save(Some(&target)).unwrap(), target);
        assert!(target.exists());
    }

    #[test]
    fn load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.tagga");
        fs::write(&path, "{\"documents\": 3").unwrap();

        let err = Project::load(&path).unwrap_err();
        assert!(matches!(err, TaggaError::CorruptProject { .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::load(&dir.path().join("absent.tagga")).unwrap_err();
        assert!(matches!(err, TaggaError::Io(_)));
    }

    #[test]
    fn import_json_requires_non_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");

        fs::write(&path, "{\"content\": \"x\"}").unwrap();
        assert!(matches!(
            Project::import_json(&path, TaggaConfig::default()),
            Err(TaggaError::InvalidImport(_))
        ));

        fs::write(&path, "[]").unwrap();
        assert!(matches!(
            Project::import_json(&path, TaggaConfig::default()),
            Err(TaggaError::InvalidImport(_))
        ));

        fs::write(&path, serde_json::to_string(&records()).unwrap()).unwrap();
        let project = Project::import_json(&path, TaggaConfig::default()).unwrap();
        assert_eq!(project.len(), 2);
    }

    #[test]
    fn vocabulary_is_shared_across_documents() {
        let mut project = Project::from_records(&records(), TaggaConfig::default()).unwrap();
        project.tag(0, 16, 20, "SKILL").unwrap();

        assert_eq!(project.autotag(1).unwrap(), 1);
        let doc = project.document(1).unwrap();
        assert!(doc.contains_key(&EntitySpan::new(0, 4, "SKILL").key()));
    }

    #[test]
    fn untag_forgets_globally() {
        let mut project = Project::from_records(&records(), TaggaConfig::default()).unwrap();
        project.tag(0, 16, 20, "SKILL").unwrap();
        project.untag(0, 16, 20, "SKILL").unwrap();

        assert!(!project.vocabulary().contains("Rust", "SKILL"));
        assert_eq!(project.autotag(1).unwrap(), 0);
        assert_eq!(project.document(0).unwrap().entity_count(), 0);
    }

    #[test]
    fn untag_keeps_entries_it_did_not_learn() {
        let mut project = Project::from_records(&records(), TaggaConfig::default()).unwrap();
        project.document_mut(1).unwrap().add_entity(0, 4, "SKILL").unwrap();
        assert!(project.untag(1, 0, 4, "SKILL").is_ok());
        assert!(matches!(
            project.untag(1, 0, 4, "SKILL"),
            Err(TaggaError::NotFound(_))
        ));
    }

    #[test]
    fn autotag_unknown_document() {
        let mut project = Project::new(TaggaConfig::default());
        assert!(matches!(project.autotag(3), Err(TaggaError::NotFound(_))));
    }

    #[test]
    fn training_examples_skip_unannotated_documents() {
        let mut project = Project::from_records(&records(), TaggaConfig::default()).unwrap();
        project.tag(0, 16, 20, "SKILL").unwrap();
        project.tag(0, 0, 10, "SKILL").unwrap();

        let examples = project.training_examples();
        assert_eq!(examples.len(), 1);
        assert_eq!(
            examples[0].entities,
            vec![EntitySpan::new(0, 10, "SKILL"), EntitySpan::new(16, 20, "SKILL")]
        );
        assert_eq!(project.labels().into_iter().collect::<Vec<_>>(), vec!["SKILL"]);
    }
}
