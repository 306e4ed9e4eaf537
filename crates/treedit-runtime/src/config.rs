#![forbid(unsafe_code)]

//! Editor configuration loaded from TOML.
//!
//! ```toml
//! # treedit.toml
//! [history]
//! max_depth = 100
//!
//! [render]
//! indent = 2
//! guides = "unicode"   # or "ascii"
//!
//! [spell]
//! dictionary = "words.txt"
//! ```
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Unknown keys are rejected to catch typos.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::MAX_INDENT;
use crate::undo::HistoryConfig;

// ---------------------------------------------------------------------------
// Top-level EditorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub history: HistorySection,
    pub render: RenderSection,
    pub spell: SpellSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistorySection {
    /// Maximum number of undoable edits kept.
    pub max_depth: usize,
    /// Byte budget across both stacks (0 = unlimited).
    pub max_bytes: usize,
}

impl Default for HistorySection {
    fn default() -> Self {
        let defaults = HistoryConfig::default();
        Self {
            max_depth: defaults.max_depth,
            max_bytes: defaults.max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    /// Width used by `print-indent` when no argument is given.
    pub indent: usize,
    pub guides: GuideStyle,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            indent: 2,
            guides: GuideStyle::Unicode,
        }
    }
}

/// Line-drawing characters for the tree view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideStyle {
    #[default]
    Unicode,
    Ascii,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpellSection {
    /// Extra words, one per line, added to the built-in list.
    pub dictionary: Option<PathBuf>,
}

impl EditorConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk. Relative dictionary paths are resolved
    /// against the file's directory.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let (Some(dict), Some(dir)) = (config.spell.dictionary.as_mut(), path.parent()) {
            if dict.is_relative() {
                *dict = dir.join(&*dict);
            }
        }
        Ok(config)
    }

    /// Returns a list of problems. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be > 0".into());
        }

        if self.render.indent > MAX_INDENT {
            errors.push(format!(
                "render.indent must be <= {MAX_INDENT}, got {}",
                self.render.indent
            ));
        }

        if self
            .spell
            .dictionary
            .as_ref()
            .is_some_and(|dict| dict.as_os_str().is_empty())
        {
            errors.push("spell.dictionary must not be empty when set".into());
        }

        errors
    }

    /// Like [`validate`](Self::validate), but as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    #[must_use]
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig::new(self.history.max_depth, self.history.max_bytes)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
