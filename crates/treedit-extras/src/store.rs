#![forbid(unsafe_code)]

//! File-backed [`DocumentStore`].
//!
//! The format is chosen by extension: `.json` files hold a serialized
//! [`ElementSnapshot`]; everything else is read and written as HTML.
//!
//! JSON nests two levels per element, and `serde_json` refuses input nested
//! deeper than 128 levels, so documents deeper than [`JSON_MAX_DEPTH`] are
//! only saved as HTML.

use std::path::Path;

use tracing::debug;
use treedit_core::{Document, ElementSnapshot};
use treedit_runtime::{DocumentStore, StoreError};

use crate::html;

/// Deepest element nesting a `.json` file is written with.
pub const JSON_MAX_DEPTH: usize = 60;

/// On-disk representation of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Html,
    Json,
}

impl StoreFormat {
    /// `.json` (any case) is JSON; everything else is HTML.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Html,
        }
    }
}

/// Reads and writes documents on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse `content` as if it had been read from `path`.
    pub fn decode(&self, content: &str, path: &Path) -> Result<Document, StoreError> {
        let snapshot = match StoreFormat::for_path(path) {
            StoreFormat::Json => serde_json::from_str::<ElementSnapshot>(content).map_err(|e| {
                StoreError::Json {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?,
            StoreFormat::Html => html::parse_document(content)
                .map_err(|e| StoreError::parse(path, e.line, e.column, e.message))?,
        };
        Document::from_snapshot(&snapshot).map_err(|source| StoreError::Tree {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize `doc` in the format `path` calls for.
    pub fn encode(&self, doc: &Document, path: &Path) -> Result<String, StoreError> {
        match StoreFormat::for_path(path) {
            StoreFormat::Json => {
                let snapshot = doc.snapshot();
                let depth = snapshot.height();
                if depth > JSON_MAX_DEPTH {
                    return Err(StoreError::Json {
                        path: path.to_path_buf(),
                        message: format!(
                            "elements nest {depth} levels deep, JSON files allow at most \
                             {JSON_MAX_DEPTH}; save as .html instead"
                        ),
                    });
                }
                let mut json = serde_json::to_string_pretty(&snapshot).map_err(|e| {
                    StoreError::Json {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                })?;
                json.push('\n');
                Ok(json)
            }
            StoreFormat::Html => Ok(html::write_document(doc)),
        }
    }
}

impl DocumentStore for FileStore {
    fn read(&self, path: &Path) -> Result<Document, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let doc = self.decode(&content, path)?;
        debug!(
            path = %path.display(),
            format = ?StoreFormat::for_path(path),
            elements = doc.element_count(),
            "read"
        );
        Ok(doc)
    }

    fn write(&self, doc: &Document, path: &Path) -> Result<(), StoreError> {
        let content = self.encode(doc, path)?;
        std::fs::write(path, content).map_err(|e| StoreError::io(path, e))?;
        debug!(
            path = %path.display(),
            format = ?StoreFormat::for_path(path),
            elements = doc.element_count(),
            "wrote"
        );
        Ok(())
    }
}
