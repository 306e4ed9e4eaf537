#![forbid(unsafe_code)]

//! Collaborator seams: rendering, spell-checking, and persistence.
//!
//! The executor owns none of these concerns. It hands the root
//! [`ElementRef`] to a renderer or checker, and swaps whole documents in and
//! out through a [`DocumentStore`]. Implementations live in `treedit-extras`;
//! tests plug in small fakes.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use treedit_core::{Document, ElementRef, TreeError};

/// Text views of the tree.
pub trait DocumentRenderer {
    /// One line per element with tree guides.
    fn render_tree(&self, root: ElementRef<'_>) -> String;

    /// Markup with children nested `indent` spaces deeper than their parent.
    fn render_indented(&self, root: ElementRef<'_>, indent: usize) -> String;
}

/// A problem found in one element's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellIssue {
    pub element_id: String,
    pub message: String,
}

impl SpellIssue {
    #[must_use]
    pub fn new(element_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            message: message.into(),
        }
    }
}

/// Scans text content. Issues come back in document order.
pub trait SpellChecker {
    fn check(&self, root: ElementRef<'_>) -> Vec<SpellIssue>;
}

/// Reads and writes whole documents.
pub trait DocumentStore {
    /// Build a fully formed document from `path`.
    fn read(&self, path: &Path) -> Result<Document, StoreError>;

    /// Persist `doc` to `path`, replacing any existing file.
    fn write(&self, doc: &Document, path: &Path) -> Result<(), StoreError>;
}

/// Errors from a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: invalid JSON: {message}", .path.display())]
    Json { path: PathBuf, message: String },

    #[error("{}:{line}:{column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// The file parsed but does not form a valid tree (duplicate ids, bad tags).
    #[error("{}: {source}", .path.display())]
    Tree {
        path: PathBuf,
        #[source]
        source: TreeError,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(
        path: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// The file the error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Json { path, .. }
            | Self::Parse { path, .. }
            | Self::Tree { path, .. } => path,
        }
    }
}
