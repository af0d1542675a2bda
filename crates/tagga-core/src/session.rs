//! # Session Commands
//!
//! An interactive session tracks the open project, the path it was last
//! saved to and the selected document. Every user action is a [`Command`]
//! mapped onto a data-model operation by [`Session::dispatch`]; the
//! returned [`Outcome`] is what a front end renders.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::TaggaConfig;
use crate::error::{Result, TaggaError};
use crate::project::Project;
use crate::types::Annotation;

/// Number of words shown per entry of the document list.
pub const PREVIEW_WORDS: usize = 3;

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Save the open project, then start a new one from a JSON import file
    /// and save it right away at the default location.
    ImportJson(PathBuf),
    LoadProject(PathBuf),
    /// Save to the path the project was loaded from or last saved to.
    SaveProject,
    SaveProjectAs(PathBuf),
    /// Select a document, autotag it and show it.
    SelectDocument(usize),
    /// Annotate the selection in the current document and learn its text.
    /// Without a label the project's default label is used.
    TagAdd {
        start: usize,
        end: usize,
        label: Option<String>,
    },
    /// Remove an annotation from the current document and forget its text.
    TagRemove {
        start: usize,
        end: usize,
        label: Option<String>,
    },
}

/// What a document looks like to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub index: usize,
    pub id: String,
    pub text: String,
    pub annotations: Vec<Annotation>,
    /// Annotations added by autotagging on selection.
    pub autotagged: usize,
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Imported { documents: usize, path: PathBuf },
    Loaded { documents: usize },
    Saved(PathBuf),
    View(DocumentView),
    Tagged(Annotation),
    Untagged(Annotation),
}

/// State of one interactive annotation session.
#[derive(Debug, Default)]
pub struct Session {
    config: TaggaConfig,
    project: Option<Project>,
    project_path: Option<PathBuf>,
    current: Option<usize>,
}

impl Session {
    pub fn new(config: TaggaConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Starts a session on an already loaded project.
    pub fn with_project(project: Project, path: Option<PathBuf>) -> Self {
        Self {
            config: project.config().clone(),
            project: Some(project),
            project_path: path,
            current: None,
        }
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn project_path(&self) -> Option<&PathBuf> {
        self.project_path.as_ref()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Short previews of every document, in project order.
    pub fn document_list(&self) -> Vec<String> {
        self.project
            .iter()
            .flat_map(|p| p.documents())
            .map(|doc| doc.preview(PREVIEW_WORDS))
            .collect()
    }

    /// Runs one command against the session state.
    ///
    /// # Errors
    ///
    /// Data-model errors are returned unchanged for the front end to show.
    /// Commands that need an open project or a selected document fail with
    /// [`TaggaError::NoActiveProject`] or [`TaggaError::NoDocumentSelected`].
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::ImportJson(path) => self.import_json(path),
            Command::LoadProject(path) => {
                let project = Project::load(&path)?;
                let documents = project.len();
                self.config = project.config().clone();
                self.project = Some(project);
                self.project_path = Some(path);
                self.current = None;
                Ok(Outcome::Loaded { documents })
            }
            Command::SaveProject => {
                let project = self.project.as_ref().ok_or(TaggaError::NoActiveProject)?;
                let path = project.save(self.project_path.as_deref())?;
                self.project_path = Some(path.clone());
                Ok(Outcome::Saved(path))
            }
            Command::SaveProjectAs(path) => {
                let project = self.project.as_ref().ok_or(TaggaError::NoActiveProject)?;
                let path = project.save(Some(&path))?;
                self.project_path = Some(path.clone());
                Ok(Outcome::Saved(path))
            }
            Command::SelectDocument(index) => self.select(index),
            Command::TagAdd { start, end, label } => {
                let (project, index) = self.current_document()?;
                let label = label.unwrap_or_else(|| project.config().default_label.clone());
                Ok(Outcome::Tagged(project.tag(index, start, end, &label)?))
            }
            Command::TagRemove { start, end, label } => {
                let (project, index) = self.current_document()?;
                let label = label.unwrap_or_else(|| project.config().default_label.clone());
                Ok(Outcome::Untagged(project.untag(index, start, end, &label)?))
            }
        }
    }

    fn import_json(&mut self, path: PathBuf) -> Result<Outcome> {
        let imported = Project::import_json(&path, self.config.clone())?;

        if let Some(active) = &self.project {
            let saved = active.save(self.project_path.as_deref())?;
            info!(path = %saved.display(), "saved previous project before import");
        }

        let saved = imported.save(None)?;
        let documents = imported.len();
        self.project = Some(imported);
        self.project_path = Some(saved.clone());
        self.current = None;
        Ok(Outcome::Imported {
            documents,
            path: saved,
        })
    }

    fn select(&mut self, index: usize) -> Result<Outcome> {
        let project = self.project.as_mut().ok_or(TaggaError::NoActiveProject)?;
        let autotagged = project.autotag(index)?;
        self.current = Some(index);

        let doc = project
            .document(index)
            .ok_or_else(|| TaggaError::NotFound(format!("document #{index}")))?;
        Ok(Outcome::View(DocumentView {
            index,
            id: doc.id().to_string(),
            text: doc.text().to_string(),
            annotations: doc.annotations_by_position().into_iter().cloned().collect(),
            autotagged,
        }))
    }

    fn current_document(&mut self) -> Result<(&mut Project, usize)> {
        let project = self.project.as_mut().ok_or(TaggaError::NoActiveProject)?;
        let index = self.current.ok_or(TaggaError::NoDocumentSelected)?;
        Ok((project, index))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn write_import(dir: &Path) -> PathBuf {
        let path = dir.join("import.json");
        let docs = json!([
            {"content": "Teamplayer and Rust developer"},
            {"content": "Rust everywhere"}
        ]);
        fs::write(&path, docs.to_string()).unwrap();
        path
    }

    fn session(dir: &Path) -> Session {
        Session::new(TaggaConfig::new().with_home(dir.join("home")))
    }

    #[test]
    fn commands_need_a_project() {
        let mut session = Session::default();
        assert!(matches!(
            session.dispatch(Command::SaveProject),
            Err(TaggaError::NoActiveProject)
        ));
        assert!(matches!(
            session.dispatch(Command::SelectDocument(0)),
            Err(TaggaError::NoActiveProject)
        ));
    }

    #[test]
    fn tagging_needs_a_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .dispatch(Command::ImportJson(write_import(dir.path())))
            .unwrap();

        let err = session
            .dispatch(Command::TagAdd {
                start: 0,
                end: 4,
                label: Some("SKILL".into()),
            })
            .unwrap_err();
        assert!(matches!(err, TaggaError::NoDocumentSelected));
    }

    #[test]
    fn import_saves_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());

        let outcome = session
            .dispatch(Command::ImportJson(write_import(dir.path())))
            .unwrap();
        let Outcome::Imported { documents, path } = outcome else {
            panic!("expected import outcome");
        };
        assert_eq!(documents, 2);
        assert!(path.exists());
        assert_eq!(session.project_path(), Some(&path));
        assert_eq!(
            session.document_list(),
            vec!["Teamplayer and Rust", "Rust everywhere"]
        );
    }

    #[test]
    fn tag_then_select_propagates_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .dispatch(Command::ImportJson(write_import(dir.path())))
            .unwrap();

        session.dispatch(Command::SelectDocument(0)).unwrap();
        let tagged = session
            .dispatch(Command::TagAdd {
                start: 15,
                end: 19,
                label: Some("SKILL".into()),
            })
            .unwrap();
        assert!(matches!(tagged, Outcome::Tagged(ref a) if a.text == "Rust"));

        let Outcome::View(view) = session.dispatch(Command::SelectDocument(1)).unwrap() else {
            panic!("expected view");
        };
        assert_eq!(view.autotagged, 1);
        assert_eq!(view.annotations[0].text, "Rust");
        assert_eq!(session.current(), Some(1));
    }

    #[test]
    fn tag_without_label_uses_project_default() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_import(dir.path());
        let config = TaggaConfig::new()
            .with_home(dir.path())
            .with_default_label("TOOL");
        let mut session = Session::new(config);
        session.dispatch(Command::ImportJson(input)).unwrap();
        session.dispatch(Command::SelectDocument(0)).unwrap();

        let tagged = session
            .dispatch(Command::TagAdd {
                start: 15,
                end: 19,
                label: None,
            })
            .unwrap();
        assert!(matches!(tagged, Outcome::Tagged(ref a) if a.label == "TOOL"));
        assert!(session.project().unwrap().vocabulary().contains("Rust", "TOOL"));

        let removed = session
            .dispatch(Command::TagRemove {
                start: 15,
                end: 19,
                label: None,
            })
            .unwrap();
        assert!(matches!(removed, Outcome::Untagged(ref a) if a.label == "TOOL"));
    }

    #[test]
    fn tag_remove_forgets_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .dispatch(Command::ImportJson(write_import(dir.path())))
            .unwrap();
        session.dispatch(Command::SelectDocument(0)).unwrap();
        session
            .dispatch(Command::TagAdd {
                start: 15,
                end: 19,
                label: Some("SKILL".into()),
            })
            .unwrap();
        session
            .dispatch(Command::TagRemove {
                start: 15,
                end: 19,
                label: Some("SKILL".into()),
            })
            .unwrap();

        let project = session.project().unwrap();
        assert!(project.vocabulary().is_empty());

        let Outcome::View(view) = session.dispatch(Command::SelectDocument(1)).unwrap() else {
            panic!("expected view");
        };
        assert_eq!(view.autotagged, 0);
    }

    #[test]
    fn save_as_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .dispatch(Command::ImportJson(write_import(dir.path())))
            .unwrap();
        session.dispatch(Command::SelectDocument(0)).unwrap();
        session
            .dispatch(Command::TagAdd {
                start: 0,
                end: 10,
                label: Some("SKILL".into()),
            })
            .unwrap();

        let target = dir.path().join("copy.tagga");
        let saved = session
            .dispatch(Command::SaveProjectAs(target.clone()))
            .unwrap();
        assert_eq!(saved, Outcome::Saved(target.clone()));

        let mut other = Session::default();
        let loaded = other.dispatch(Command::LoadProject(target.clone())).unwrap();
        assert_eq!(loaded, Outcome::Loaded { documents: 2 });
        assert_eq!(other.project(), session.project());
        assert_eq!(other.dispatch(Command::SaveProject).unwrap(), Outcome::Saved(target));
    }

    #[test]
    fn select_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        session
            .dispatch(Command::ImportJson(write_import(dir.path())))
            .unwrap();
        assert!(matches!(
            session.dispatch(Command::SelectDocument(9)),
            Err(TaggaError::NotFound(_))
        ));
        assert_eq!(session.current(), None);
    }
}
