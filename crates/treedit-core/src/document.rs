#![forbid(unsafe_code)]

//! Element tree with an O(1) id index.
//!
//! # Invariants
//!
//! 1. `index` maps exactly the ids of live nodes to their keys
//! 2. Exactly one node (the root) has no parent
//! 3. A node with a parent appears exactly once in that parent's `children`
//! 4. Every node is reachable from the root, so the tree has no cycles
//! 5. Ids are unique and non-empty; tags are well-formed
//!
//! Every mutating operation validates before it touches the arena, so a
//! failed call leaves the document unchanged.
//!
//! # Storage
//!
//! ```text
//! slots:  [ Some(html#root) | Some(p#a) | None | Some(b#c) ]
//! free:   [ 2 ]
//! index:  { "root" -> 0, "a" -> 1, "c" -> 3 }
//! ```
//!
//! Links between nodes are slot keys, so renaming an element only rekeys
//! its `index` entry.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::element::{ElementRef, ElementSnapshot, Node, NodeKey, RemovedSubtree};
use crate::error::{Result, TreeError, validate_id, validate_tag};

/// Id of the root element in a freshly initialized document.
pub const ROOT_ID: &str = "root";
/// Tag of the root element in a freshly initialized document.
pub const ROOT_TAG: &str = "html";

/// A rooted element tree.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<String, NodeKey>,
    root: NodeKey,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a single `html` root with id `"root"`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root_node(Node {
            tag: ROOT_TAG.to_owned(),
            id: ROOT_ID.to_owned(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Build a document from a root snapshot.
    ///
    /// Fails on the first invalid tag or id, or on a repeated id.
    pub fn from_snapshot(root: &ElementSnapshot) -> Result<Self> {
        check_snapshot(root, |_| false)?;
        let mut doc = Self::with_root_node(Node {
            tag: root.tag.clone(),
            id: root.id.clone(),
            text: root.text.clone(),
            parent: None,
            children: Vec::with_capacity(root.children.len()),
        });
        let root_key = doc.root;
        for child in &root.children {
            doc.graft(root_key, child, None);
        }
        Ok(doc)
    }

    fn with_root_node(node: Node) -> Self {
        let key = NodeKey(0);
        let mut index = HashMap::new();
        index.insert(node.id.clone(), key);
        Self {
            slots: vec![Some(node)],
            free: Vec::new(),
            index,
            root: key,
        }
    }

    // ========================================================================
    // Read interface
    // ========================================================================

    #[must_use]
    pub fn root(&self) -> ElementRef<'_> {
        match self.element(self.root) {
            Some(root) => root,
            None => unreachable!("the root slot is never released"),
        }
    }

    #[must_use]
    pub fn root_id(&self) -> &str {
        self.root().id()
    }

    /// Number of elements, root included.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.key_of(id).and_then(|key| self.element(key))
    }

    /// All ids currently in the document, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Detached copy of the whole tree.
    #[must_use]
    pub fn snapshot(&self) -> ElementSnapshot {
        self.root().to_snapshot()
    }

    pub(crate) fn element(&self, key: NodeKey) -> Option<ElementRef<'_>> {
        self.slots
            .get(key.0)?
            .as_ref()
            .map(|node| ElementRef::new(self, key, node))
    }

    // ========================================================================
    // Structural edits
    // ========================================================================

    /// Create an element as the last child of `parent_id`.
    pub fn add_element(&mut self, tag: &str, id: &str, parent_id: &str, text: &str) -> Result<()> {
        validate_tag(tag)?;
        validate_id(id)?;
        if self.contains(id) {
            return Err(TreeError::duplicate(id));
        }
        let parent = self
            .key_of(parent_id)
            .ok_or_else(|| TreeError::parent_not_found(parent_id))?;

        let key = self.alloc(Node {
            tag: tag.to_owned(),
            id: id.to_owned(),
            text: text.to_owned(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.index.insert(id.to_owned(), key);
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(key);
        }
        trace!(tag, id, parent = parent_id, "element added");
        Ok(())
    }

    /// Remove an element and its whole subtree.
    ///
    /// The returned [`RemovedSubtree`] can be handed back to
    /// [`Document::restore_subtree`] to undo the removal.
    pub fn delete_element(&mut self, id: &str) -> Result<RemovedSubtree> {
        let key = self.key_of(id).ok_or_else(|| TreeError::not_found(id))?;
        if key == self.root {
            return Err(TreeError::CannotDeleteRoot { id: id.to_owned() });
        }

        let element = self.element(key).ok_or_else(|| TreeError::not_found(id))?;
        let snapshot = element.to_snapshot();
        let parent = element
            .parent()
            .ok_or_else(|| TreeError::CannotDeleteRoot { id: id.to_owned() })?;
        let parent_key = parent.key();
        let parent_id = parent.id().to_owned();

        let parent_node = self
            .node_mut(parent_key)
            .ok_or_else(|| TreeError::parent_not_found(&parent_id))?;
        let position = parent_node
            .children
            .iter()
            .position(|&child| child == key)
            .ok_or_else(|| TreeError::not_found(id))?;
        parent_node.children.remove(position);
        self.release(key);

        trace!(
            id,
            parent = %parent_id,
            position,
            removed = snapshot.element_count(),
            "subtree removed"
        );
        Ok(RemovedSubtree {
            parent_id,
            position,
            snapshot,
        })
    }

    /// Reattach a previously removed subtree under its recorded parent.
    ///
    /// The position is clamped to the parent's current child count. Every id
    /// in the subtree is checked before anything is attached.
    pub fn restore_subtree(&mut self, removed: &RemovedSubtree) -> Result<()> {
        let parent = self
            .key_of(&removed.parent_id)
            .ok_or_else(|| TreeError::parent_not_found(&removed.parent_id))?;
        check_snapshot(&removed.snapshot, |id| self.index.contains_key(id))?;
        self.graft(parent, &removed.snapshot, Some(removed.position));
        trace!(
            id = %removed.snapshot.id,
            parent = %removed.parent_id,
            position = removed.position,
            "subtree restored"
        );
        Ok(())
    }

    /// Replace an element's text, returning the previous text.
    pub fn edit_text(&mut self, id: &str, text: &str) -> Result<String> {
        let key = self.key_of(id).ok_or_else(|| TreeError::not_found(id))?;
        let node = self.node_mut(key).ok_or_else(|| TreeError::not_found(id))?;
        let previous = std::mem::replace(&mut node.text, text.to_owned());
        trace!(id, "text edited");
        Ok(previous)
    }

    /// Rename an element. Position and children are untouched.
    pub fn edit_id(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        let key = self.key_of(old_id).ok_or_else(|| TreeError::not_found(old_id))?;
        validate_id(new_id)?;
        if old_id == new_id {
            return Ok(());
        }
        if self.contains(new_id) {
            return Err(TreeError::duplicate(new_id));
        }

        {
            let node = self.node_mut(key).ok_or_else(|| TreeError::not_found(old_id))?;
            node.id = new_id.to_owned();
        }
        self.index.remove(old_id);
        self.index.insert(new_id.to_owned(), key);
        trace!(old_id, new_id, "id edited");
        Ok(())
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Check every structural invariant, returning a description of each
    /// violation. An empty list means the document is consistent.
    #[must_use]
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, &key) in &self.index {
            match self.slots.get(key.0).and_then(Option::as_ref) {
                Some(node) if node.id == *id => {}
                Some(node) => errors.push(format!(
                    "index entry '{id}' points at node '{}'",
                    node.id
                )),
                None => errors.push(format!("index entry '{id}' points at an empty slot")),
            }
        }

        let live = self.slots.iter().filter(|slot| slot.is_some()).count();
        if live != self.index.len() {
            errors.push(format!(
                "{live} live nodes but {} index entries",
                self.index.len()
            ));
        }

        for (slot, node) in self.slots.iter().enumerate() {
            let Some(node) = node else { continue };
            let key = NodeKey(slot);
            match node.parent {
                None if key != self.root => {
                    errors.push(format!("non-root node '{}' has no parent", node.id));
                }
                Some(_) if key == self.root => {
                    errors.push(format!("root node '{}' has a parent", node.id));
                }
                Some(parent) => {
                    let occurrences = self
                        .slots
                        .get(parent.0)
                        .and_then(Option::as_ref)
                        .map_or(0, |p| p.children.iter().filter(|&&c| c == key).count());
                    if occurrences != 1 {
                        errors.push(format!(
                            "node '{}' appears {occurrences} times in its parent's children",
                            node.id
                        ));
                    }
                }
                None => {}
            }
            for &child in &node.children {
                let child_parent = self
                    .slots
                    .get(child.0)
                    .and_then(Option::as_ref)
                    .and_then(|c| c.parent);
                if child_parent != Some(key) {
                    errors.push(format!(
                        "child slot {} of '{}' does not point back at it",
                        child.0, node.id
                    ));
                }
            }
        }

        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            if !visited.insert(key) {
                errors.push(format!("slot {} reached twice from the root", key.0));
                continue;
            }
            if let Some(node) = self.slots.get(key.0).and_then(Option::as_ref) {
                stack.extend(node.children.iter().copied());
            }
        }
        if visited.len() != live {
            errors.push(format!(
                "{} nodes reachable from the root, {live} live",
                visited.len()
            ));
        }

        errors
    }

    // ========================================================================
    // Arena plumbing
    // ========================================================================

    fn key_of(&self, id: &str) -> Option<NodeKey> {
        self.index.get(id).copied()
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.slots.get_mut(key.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node) -> NodeKey {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeKey(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeKey(self.slots.len() - 1)
            }
        }
    }

    /// Free a node and everything below it, dropping their index entries.
    fn release(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.slots.get_mut(key.0).and_then(Option::take) {
                self.index.remove(&node.id);
                stack.extend(node.children);
                self.free.push(key.0);
            }
        }
    }

    /// Materialize a snapshot under `parent`. The snapshot must already be
    /// validated against the index.
    fn graft(&mut self, parent: NodeKey, snapshot: &ElementSnapshot, position: Option<usize>) {
        let mut pending = vec![(parent, snapshot, position)];
        while let Some((parent, snapshot, position)) = pending.pop() {
            let key = self.alloc(Node {
                tag: snapshot.tag.clone(),
                id: snapshot.id.clone(),
                text: snapshot.text.clone(),
                parent: Some(parent),
                children: Vec::with_capacity(snapshot.children.len()),
            });
            self.index.insert(snapshot.id.clone(), key);
            if let Some(parent_node) = self.node_mut(parent) {
                match position {
                    Some(at) => {
                        let at = at.min(parent_node.children.len());
                        parent_node.children.insert(at, key);
                    }
                    None => parent_node.children.push(key),
                }
            }
            pending.extend(snapshot.children.iter().rev().map(|child| (key, child, None)));
        }
    }
}

/// Validate a snapshot's tags and ids, rejecting ids repeated within the
/// snapshot or reported as `taken`.
fn check_snapshot(root: &ElementSnapshot, taken: impl Fn(&str) -> bool) -> Result<()> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(snapshot) = stack.pop() {
        validate_tag(&snapshot.tag)?;
        validate_id(&snapshot.id)?;
        if taken(&snapshot.id) || !seen.insert(snapshot.id.as_str()) {
            return Err(TreeError::duplicate(&snapshot.id));
        }
        stack.extend(snapshot.children.iter().rev());
    }
    Ok(())
}
