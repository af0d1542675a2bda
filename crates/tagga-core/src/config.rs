//! # Project Configuration
//!
//! Explicit configuration passed to projects and sessions: which import
//! field holds the document text, where projects are stored by default and
//! how each label is displayed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default import field holding the document text.
pub const DEFAULT_TEXT_FIELD: &str = "content";

/// Default label applied by interactive tagging.
pub const DEFAULT_LABEL: &str = "SKILL";

/// File extension of saved projects.
pub const PROJECT_EXTENSION: &str = "tagga";

/// Border style of a highlighted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relief {
    Flat,
    Raised,
    Sunken,
    Ridge,
    Groove,
    Solid,
}

impl fmt::Display for Relief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Raised => write!(f, "raised"),
            Self::Sunken => write!(f, "sunken"),
            Self::Ridge => write!(f, "ridge"),
            Self::Groove => write!(f, "groove"),
            Self::Solid => write!(f, "solid"),
        }
    }
}

/// Display styling for one label. Unset fields fall back to the renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relief: Option<Relief>,
}

impl TagStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foreground(mut self, color: impl Into<String>) -> Self {
        self.foreground = Some(color.into());
        self
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    pub fn with_border(mut self, width: u32, relief: Relief) -> Self {
        self.border_width = Some(width);
        self.relief = Some(relief);
        self
    }
}

/// Configuration shared by a project and every document in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggaConfig {
    /// Import field holding the document text.
    pub text_field: String,
    /// Directory where projects are saved when no path is given.
    pub home: PathBuf,
    /// Display styling per label.
    pub tag_styles: BTreeMap<String, TagStyle>,
    /// Label applied by interactive tagging when none is given.
    pub default_label: String,
}

impl Default for TaggaConfig {
    fn default() -> Self {
        let mut tag_styles = BTreeMap::new();
        tag_styles.insert(
            "SKILL".to_string(),
            TagStyle::new()
                .with_foreground("green")
                .with_border(2, Relief::Ridge),
        );
        tag_styles.insert(
            "activity".to_string(),
            TagStyle::new()
                .with_foreground("blue")
                .with_background("gray"),
        );

        Self {
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            home: default_home(),
            tag_styles,
            default_label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl TaggaConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the import field holding the document text.
    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }

    /// Set the default project directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Add or replace the styling of a label.
    pub fn with_tag_style(mut self, label: impl Into<String>, style: TagStyle) -> Self {
        self.tag_styles.insert(label.into(), style);
        self
    }

    /// Set the label used by interactive tagging.
    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }

    /// Styling for `label`, if one is configured.
    pub fn style_for(&self, label: &str) -> Option<&TagStyle> {
        self.tag_styles.get(label)
    }

    /// Default save location for a project created at `timestamp`.
    pub fn default_project_path(&self, timestamp: &str) -> PathBuf {
        self.home
            .join(format!("tagga_project-{timestamp}.{PROJECT_EXTENSION}"))
    }
}

/// Default storage home: `<data dir>/tagga`, or the working directory.
pub fn default_home() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tagga")
}
