#![forbid(unsafe_code)]

//! Recorded edits and their inverses.
//!
//! An [`EditRecord`] is what the history stores for each mutating command.
//! It carries everything needed to move the document in either direction,
//! so undo never re-derives state from the forward arguments.
//!
//! # Invariants
//!
//! - `undo()` right after the edit (or after `redo()`) restores the prior
//!   tree exactly, including whole deleted subtrees
//! - `redo()` right after `undo()` restores the edited tree exactly
//!
//! # Failure Modes
//!
//! - **State drift**: the document was changed outside the history (for
//!   example by calling [`Document`] methods directly). The inverse then
//!   fails with a [`TreeError`] and the history keeps the record where it was.

use treedit_core::{Document, RemovedSubtree, TreeError};

use crate::command::ElementSpec;

/// Which command created an element. Both share one code path; the kind
/// only affects messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertKind {
    Insert,
    Append,
}

impl InsertKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Append => "append",
        }
    }
}

/// One reversible entry in the edit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRecord {
    /// An element was created; undo deletes it.
    Insert { kind: InsertKind, spec: ElementSpec },
    /// A subtree was removed; undo reattaches the captured snapshot.
    Delete { removed: RemovedSubtree },
    /// Text was replaced; undo writes `before` back.
    EditText {
        id: String,
        before: String,
        after: String,
    },
    /// An element was renamed; undo renames it back.
    EditId { old_id: String, new_id: String },
}

impl EditRecord {
    /// Revert this edit.
    pub fn undo(&mut self, doc: &mut Document) -> Result<(), TreeError> {
        match self {
            Self::Insert { spec, .. } => doc.delete_element(&spec.id).map(|_| ()),
            Self::Delete { removed } => doc.restore_subtree(removed),
            Self::EditText { id, before, .. } => doc.edit_text(id, before).map(|_| ()),
            Self::EditId { old_id, new_id } => doc.edit_id(new_id, old_id),
        }
    }

    /// Apply this edit again after it was undone.
    pub fn redo(&mut self, doc: &mut Document) -> Result<(), TreeError> {
        match self {
            Self::Insert { spec, .. } => {
                doc.add_element(&spec.tag, &spec.id, &spec.parent_id, &spec.text)
            }
            Self::Delete { removed } => {
                *removed = doc.delete_element(&removed.snapshot.id)?;
                Ok(())
            }
            Self::EditText { id, after, .. } => doc.edit_text(id, after).map(|_| ()),
            Self::EditId { old_id, new_id } => doc.edit_id(old_id, new_id),
        }
    }

    /// Command name that produced the record.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert { kind, .. } => kind.as_str(),
            Self::Delete { .. } => "delete",
            Self::EditText { .. } => "edit-text",
            Self::EditId { .. } => "edit-id",
        }
    }

    /// Id of the element the record is about, as of the edited state.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Insert { spec, .. } => &spec.id,
            Self::Delete { removed } => &removed.snapshot.id,
            Self::EditText { id, .. } => id,
            Self::EditId { new_id, .. } => new_id,
        }
    }

    /// Human-readable description for status lines.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Insert { kind, spec } => format!(
                "{} {}#{} under {}",
                kind.as_str(),
                spec.tag,
                spec.id,
                spec.parent_id
            ),
            Self::Delete { removed } => {
                let count = removed.snapshot.element_count();
                if count == 1 {
                    format!("delete {}", removed.snapshot.id)
                } else {
                    format!("delete {} ({count} elements)", removed.snapshot.id)
                }
            }
            Self::EditText { id, .. } => format!("edit-text {id}"),
            Self::EditId { old_id, new_id } => format!("edit-id {old_id} -> {new_id}"),
        }
    }

    /// Size in bytes for history budgeting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + match self {
                Self::Insert { spec, .. } => spec.size_bytes(),
                Self::Delete { removed } => removed.size_bytes(),
                Self::EditText { id, before, after } => id.len() + before.len() + after.len(),
                Self::EditId { old_id, new_id } => old_id.len() + new_id.len(),
            }
    }
}
