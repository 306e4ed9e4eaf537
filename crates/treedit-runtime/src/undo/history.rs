#![forbid(unsafe_code)]

//! Linear edit history.
//!
//! [`HistoryManager`] keeps applied [`EditRecord`]s on a past stack and
//! undone ones on a future stack. Both stacks share a depth cap and a byte
//! cap; the oldest records go first when either is exceeded. Recording a
//! fresh edit discards the future.
//!
//! # Invariants
//!
//! 1. `total_bytes` is the sum of `size_bytes()` over both stacks
//! 2. After every call, `undo_stack.len() <= config.max_depth`
//! 3. After every call, `total_bytes <= config.max_bytes` unless it is 0,
//!    or the newest undo record alone is larger than the cap
//! 4. `push` empties the redo stack
//! 5. `undo`/`redo` move exactly one record, and only when its inverse or
//!    forward application succeeded
//!
//! ```text
//! push(insert a), push(insert b), push(delete a)
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [insert a, insert b, delete a]    │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [insert a]                        │
//! │ Redo Stack: [delete a, insert b]              │
//! └───────────────────────────────────────────────┘
//!
//! push(edit-text a)  <-- new branch, clears redo
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [insert a, edit-text a]           │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;
use treedit_core::{Document, TreeError};

use super::record::EditRecord;

/// Limits for a [`HistoryManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Undoable edits kept; older ones are dropped.
    pub max_depth: usize,
    /// Byte cap across both stacks (0 = no cap).
    pub max_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl HistoryConfig {
    /// Limits set by hand.
    #[must_use]
    pub fn new(max_depth: usize, max_bytes: usize) -> Self {
        Self {
            max_depth,
            max_bytes,
        }
    }

    /// No depth or byte cap. Used by tests and fuzzing.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes: 0,
        }
    }
}

/// Past and future edits of one document.
#[derive(Clone)]
pub struct HistoryManager {
    /// Records available for undo (newest at back).
    undo_stack: VecDeque<EditRecord>,
    /// Records available for redo (newest at back).
    redo_stack: VecDeque<EditRecord>,
    config: HistoryConfig,
    /// Bytes held by both stacks.
    total_bytes: usize,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("total_bytes", &self.total_bytes)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryManager {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config,
            total_bytes: 0,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Record an edit that has already been applied to the document.
    /// Discards the redo stack, then trims to the configured limits.
    pub fn push(&mut self, record: EditRecord) {
        self.clear_redo();
        self.total_bytes += record.size_bytes();
        self.undo_stack.push_back(record);
        self.enforce_limits();
    }

    /// Revert the newest edit against `doc` and move it to the redo stack.
    ///
    /// `None` when there is nothing to undo. On `Err` the record stays
    /// where it was.
    pub fn undo(&mut self, doc: &mut Document) -> Option<Result<String, TreeError>> {
        let mut record = self.undo_stack.pop_back()?;
        let description = record.description();
        let old_size = record.size_bytes();

        match record.undo(doc) {
            Ok(()) => {
                self.resize(old_size, record.size_bytes());
                self.redo_stack.push_back(record);
                debug!(
                    command = %description,
                    undo_depth = self.undo_stack.len(),
                    redo_depth = self.redo_stack.len(),
                    "undo"
                );
                Some(Ok(description))
            }
            Err(e) => {
                self.undo_stack.push_back(record);
                Some(Err(e))
            }
        }
    }

    /// Reapply the most recently undone edit and move it back to the undo
    /// stack. Same return contract as [`Self::undo`].
    pub fn redo(&mut self, doc: &mut Document) -> Option<Result<String, TreeError>> {
        let mut record = self.redo_stack.pop_back()?;
        let old_size = record.size_bytes();

        match record.redo(doc) {
            Ok(()) => {
                self.resize(old_size, record.size_bytes());
                let description = record.description();
                self.undo_stack.push_back(record);
                debug!(
                    command = %description,
                    undo_depth = self.undo_stack.len(),
                    redo_depth = self.redo_stack.len(),
                    "redo"
                );
                Some(Ok(description))
            }
            Err(e) => {
                self.redo_stack.push_back(record);
                Some(Err(e))
            }
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo descriptions, newest first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(EditRecord::description)
            .collect()
    }

    /// Redo descriptions, newest first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        self.redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(EditRecord::description)
            .collect()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(EditRecord::description)
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(EditRecord::description)
    }

    /// The record the next `undo` would revert.
    #[must_use]
    pub fn peek_undo(&self) -> Option<&EditRecord> {
        self.undo_stack.back()
    }

    /// Bytes held by both stacks.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.total_bytes
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_bytes = 0;
    }

    fn clear_redo(&mut self) {
        for record in self.redo_stack.drain(..) {
            self.total_bytes = self.total_bytes.saturating_sub(record.size_bytes());
        }
    }

    /// A redone delete captures a fresh snapshot, so sizes can move.
    fn resize(&mut self, old_size: usize, new_size: usize) {
        self.total_bytes = self.total_bytes.saturating_sub(old_size) + new_size;
    }

    /// Enforce depth and memory limits by evicting oldest records.
    fn enforce_limits(&mut self) {
        while self.undo_stack.len() > self.config.max_depth {
            if let Some(record) = self.undo_stack.pop_front() {
                self.total_bytes = self.total_bytes.saturating_sub(record.size_bytes());
            }
        }

        if self.config.max_bytes > 0 {
            while self.total_bytes > self.config.max_bytes {
                // Redo entries go first, then the oldest undo entries. The
                // newest undo entry is never evicted.
                let evicted = match self.redo_stack.pop_front() {
                    Some(record) => record,
                    None if self.undo_stack.len() > 1 => match self.undo_stack.pop_front() {
                        Some(record) => record,
                        None => break,
                    },
                    None => break,
                };
                self.total_bytes = self.total_bytes.saturating_sub(evicted.size_bytes());
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ElementSpec;
    use crate::undo::record::InsertKind;

    /// Apply an insert to the document and return its record, so undo()
    /// has something real to revert.
    fn insert(doc: &mut Document, id: &str) -> EditRecord {
        let spec = ElementSpec::new("p", id, "root", id);
        doc.add_element(&spec.tag, &spec.id, &spec.parent_id, &spec.text)
            .expect("test insert should apply");
        EditRecord::Insert {
            kind: InsertKind::Insert,
            spec,
        }
    }

    #[test]
    fn test_new_manager() {
        let mgr = HistoryManager::default();
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert_eq!(mgr.undo_depth(), 0);
        assert_eq!(mgr.redo_depth(), 0);
    }

    #[test]
    fn test_push_enables_undo() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));

        assert!(mgr.can_undo());
        assert!(!mgr.can_redo());
        assert_eq!(mgr.undo_depth(), 1);
    }

    #[test]
    fn test_undo_enables_redo() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));

        let result = mgr.undo(&mut doc);
        assert_eq!(result, Some(Ok("insert p#a under root".to_string())));
        assert!(!doc.contains("a"));
        assert!(!mgr.can_undo());
        assert!(mgr.can_redo());
    }

    #[test]
    fn test_redo_moves_back_to_undo() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));
        mgr.undo(&mut doc);

        let result = mgr.redo(&mut doc);
        assert!(matches!(result, Some(Ok(_))));
        assert!(doc.contains("a"));
        assert!(mgr.can_undo());
        assert!(!mgr.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));
        mgr.undo(&mut doc);
        assert!(mgr.can_redo());

        mgr.push(insert(&mut doc, "b"));
        assert!(!mgr.can_redo());
        assert_eq!(mgr.redo_depth(), 0);
    }

    #[test]
    fn test_failed_undo_keeps_record() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));
        doc.delete_element("a").unwrap();

        let result = mgr.undo(&mut doc);
        assert!(matches!(result, Some(Err(TreeError::NotFound { .. }))));
        assert_eq!(mgr.undo_depth(), 1);
        assert_eq!(mgr.redo_depth(), 0);
    }

    #[test]
    fn test_failed_redo_keeps_record() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));
        mgr.undo(&mut doc);
        doc.add_element("p", "a", "root", "squatter").unwrap();

        let result = mgr.redo(&mut doc);
        assert!(matches!(result, Some(Err(TreeError::DuplicateId { .. }))));
        assert_eq!(mgr.undo_depth(), 0);
        assert_eq!(mgr.redo_depth(), 1);
    }

    #[test]
    fn test_max_depth_enforced() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::new(HistoryConfig::new(3, 0));
        for i in 0..5 {
            mgr.push(insert(&mut doc, &format!("cmd{i}")));
        }
        assert_eq!(mgr.undo_depth(), 3);
        assert_eq!(
            mgr.undo_descriptions(10),
            vec![
                "insert p#cmd4 under root",
                "insert p#cmd3 under root",
                "insert p#cmd2 under root"
            ]
        );
    }

    #[test]
    fn test_next_descriptions() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));

        assert_eq!(
            mgr.next_undo_description().as_deref(),
            Some("insert p#a under root")
        );
        assert_eq!(mgr.next_redo_description(), None);

        mgr.undo(&mut doc);
        assert_eq!(mgr.next_undo_description(), None);
        assert_eq!(
            mgr.next_redo_description().as_deref(),
            Some("insert p#a under root")
        );
    }

    #[test]
    fn test_clear() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        mgr.push(insert(&mut doc, "a"));
        mgr.push(insert(&mut doc, "b"));
        mgr.undo(&mut doc);

        mgr.clear();
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert_eq!(mgr.memory_usage(), 0);
    }

    #[test]
    fn test_memory_tracking_after_undo_redo() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::new(HistoryConfig::unlimited());
        assert_eq!(mgr.memory_usage(), 0);

        mgr.push(insert(&mut doc, "a"));
        let after_push = mgr.memory_usage();
        assert!(after_push > 0);

        mgr.undo(&mut doc);
        assert_eq!(mgr.memory_usage(), after_push);
        mgr.redo(&mut doc);
        assert_eq!(mgr.memory_usage(), after_push);
    }

    #[test]
    fn test_memory_byte_limit_evicts_old_records() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::new(HistoryConfig::new(100, 1));
        for i in 0..5 {
            mgr.push(insert(&mut doc, &format!("cmd{i}")));
        }
        assert_eq!(mgr.undo_depth(), 1);
        assert_eq!(mgr.next_undo_description().as_deref(), Some("insert p#cmd4 under root"));
    }

    #[test]
    fn test_oversized_record_stays_undoable() {
        let mut doc = Document::new();
        doc.add_element("p", "big", "root", &"x".repeat(4096)).unwrap();
        let mut mgr = HistoryManager::new(HistoryConfig::new(100, 1024));
        mgr.push(insert(&mut doc, "small"));

        let removed = doc.delete_element("big").unwrap();
        mgr.push(EditRecord::Delete { removed });
        assert!(mgr.memory_usage() > 1024);
        assert_eq!(mgr.undo_depth(), 1);

        assert_eq!(mgr.undo(&mut doc).unwrap().unwrap(), "delete big");
        assert_eq!(doc.get_element_by_id("big").unwrap().text().len(), 4096);
    }

    #[test]
    fn test_undo_without_records() {
        let mut doc = Document::new();
        let mut mgr = HistoryManager::default();
        assert!(mgr.undo(&mut doc).is_none());
        assert!(mgr.redo(&mut doc).is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config = HistoryConfig::default();
        assert_eq!(config.max_depth, 100);
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        let unlimited = HistoryConfig::unlimited();
        assert_eq!(unlimited.max_depth, usize::MAX);
        assert_eq!(unlimited.max_bytes, 0);
    }

    #[test]
    fn test_debug_impl() {
        let mgr = HistoryManager::default();
        let debug_str = format!("{mgr:?}");
        assert!(debug_str.contains("HistoryManager"));
        assert!(debug_str.contains("undo_depth"));
    }
}
