#![forbid(unsafe_code)]

//! One document and its edit history.
//!
//! Mutations go through the session so that every successful edit is
//! recorded exactly once and a failed edit records nothing. Replacing the
//! document (`init`, `read`) starts a fresh history.

use tracing::{debug, info};
use treedit_core::{Document, TreeError};

use crate::command::ElementSpec;
use crate::undo::{EditRecord, HistoryConfig, HistoryManager, InsertKind};

/// Editing session state: the document plus its undo/redo stacks.
#[derive(Debug, Clone, Default)]
pub struct Session {
    document: Document,
    history: HistoryManager,
}

impl Session {
    /// Fresh root-only document with an empty history.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            document: Document::new(),
            history: HistoryManager::new(config),
        }
    }

    /// Start from an existing document.
    #[must_use]
    pub fn with_document(document: Document, config: HistoryConfig) -> Self {
        Self {
            document,
            history: HistoryManager::new(config),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Swap in a new document. Both history stacks are cleared.
    pub fn replace_document(&mut self, document: Document) {
        info!(
            root = document.root_id(),
            elements = document.element_count(),
            discarded_undo = self.history.undo_depth(),
            discarded_redo = self.history.redo_depth(),
            "document replaced"
        );
        self.document = document;
        self.history.clear();
    }

    // ========================================================================
    // Recorded edits
    // ========================================================================

    /// Shared path for `insert` and `append`.
    pub fn insert(&mut self, kind: InsertKind, spec: ElementSpec) -> Result<(), TreeError> {
        self.document
            .add_element(&spec.tag, &spec.id, &spec.parent_id, &spec.text)?;
        self.record(EditRecord::Insert { kind, spec });
        Ok(())
    }

    /// Delete `id` and its subtree. Returns how many elements were removed.
    pub fn delete(&mut self, id: &str) -> Result<usize, TreeError> {
        let removed = self.document.delete_element(id)?;
        let count = removed.snapshot.element_count();
        self.record(EditRecord::Delete { removed });
        Ok(count)
    }

    pub fn edit_text(&mut self, id: &str, text: &str) -> Result<(), TreeError> {
        let before = self.document.edit_text(id, text)?;
        self.record(EditRecord::EditText {
            id: id.to_owned(),
            before,
            after: text.to_owned(),
        });
        Ok(())
    }

    pub fn edit_id(&mut self, old_id: &str, new_id: &str) -> Result<(), TreeError> {
        self.document.edit_id(old_id, new_id)?;
        self.record(EditRecord::EditId {
            old_id: old_id.to_owned(),
            new_id: new_id.to_owned(),
        });
        Ok(())
    }

    fn record(&mut self, record: EditRecord) {
        debug!(
            command = record.name(),
            id = record.target(),
            undo_depth = self.history.undo_depth() + 1,
            "applied"
        );
        self.history.push(record);
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Revert the most recent edit. `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Result<String, TreeError>> {
        self.history.undo(&mut self.document)
    }

    /// Re-apply the most recently undone edit. `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Result<String, TreeError>> {
        self.history.redo(&mut self.document)
    }
}
