#![forbid(unsafe_code)]

//! Element storage records, borrowed views, and owned subtree snapshots.
//!
//! Nodes live in the [`Document`] arena and refer to each other by
//! [`NodeKey`]. Callers never see nodes directly; they read through
//! [`ElementRef`], a borrowed view tied to the document's lifetime.
//!
//! [`ElementSnapshot`] is the owned counterpart: an element plus all of its
//! descendants, detached from any arena. Deleting an element yields a
//! snapshot so the whole subtree can be put back later.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Opaque arena slot address for a node.
///
/// Keys are stable for the lifetime of a node and are recycled after the
/// node is deleted, so they must not be held across structural edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub(crate) usize);

impl NodeKey {
    /// Raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Arena record for one element.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) tag: String,
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

/// Borrowed, read-only view of an element inside a [`Document`].
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    doc: &'a Document,
    key: NodeKey,
    node: &'a Node,
}

impl<'a> ElementRef<'a> {
    pub(crate) fn new(doc: &'a Document, key: NodeKey, node: &'a Node) -> Self {
        Self { doc, key, node }
    }

    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    #[must_use]
    pub fn tag(&self) -> &'a str {
        &self.node.tag
    }

    #[must_use]
    pub fn id(&self) -> &'a str {
        &self.node.id
    }

    #[must_use]
    pub fn text(&self) -> &'a str {
        &self.node.text
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.node.parent.is_none()
    }

    /// Parent element, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<ElementRef<'a>> {
        self.node.parent.and_then(|key| self.doc.element(key))
    }

    /// Children in document order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = ElementRef<'a>> + 'a {
        let doc = self.doc;
        let node = self.node;
        node.children
            .iter()
            .filter_map(move |&key| doc.element(key))
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    /// Number of ancestors; the root has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent();
        }
        depth
    }

    /// Pre-order walk over this element and everything below it.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            doc: self.doc,
            stack: vec![self.key],
        }
    }

    /// Detached copy of this element and its subtree.
    #[must_use]
    pub fn to_snapshot(&self) -> ElementSnapshot {
        let mut builder = SnapshotBuilder::default();
        for element in self.descendants() {
            builder.push(
                ElementSnapshot::new(element.tag(), element.id()).with_text(element.text()),
                element.children().count(),
            );
        }
        builder.finish().unwrap_or_default()
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("tag", &self.tag())
            .field("id", &self.id())
            .field("text", &self.text())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Pre-order iterator returned by [`ElementRef::descendants`].
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeKey>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = ElementRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(key) = self.stack.pop() {
            if let Some(element) = self.doc.element(key) {
                self.stack.extend(element.node.children.iter().rev().copied());
                return Some(element);
            }
        }
        None
    }
}

/// Owned copy of an element and all of its descendants.
///
/// `Clone`, `PartialEq` and `Drop` walk the subtree with an explicit stack
/// instead of recursing.
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementSnapshot {
    pub tag: String,
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "String::is_empty"))]
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<ElementSnapshot>,
}

impl ElementSnapshot {
    #[must_use]
    pub fn new(tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: id.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child snapshot.
    #[must_use]
    pub fn child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }

    /// Pre-order walk over this snapshot and its descendants, each paired
    /// with its depth below `self`.
    #[must_use]
    pub fn walk(&self) -> SnapshotWalk<'_> {
        SnapshotWalk {
            stack: vec![(0, self)],
        }
    }

    /// Ids of this element and every descendant, pre-order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.walk().map(|(_, snapshot)| snapshot.id.as_str()).collect()
    }

    /// Number of elements in the subtree, including this one.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.walk().count()
    }

    /// Levels below this element; a leaf has height 0.
    #[must_use]
    pub fn height(&self) -> usize {
        self.walk().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    /// Approximate heap footprint, used for history accounting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.walk()
            .map(|(_, snapshot)| {
                std::mem::size_of::<Self>()
                    + snapshot.tag.len()
                    + snapshot.id.len()
                    + snapshot.text.len()
            })
            .sum()
    }
}

impl Clone for ElementSnapshot {
    fn clone(&self) -> Self {
        let mut builder = SnapshotBuilder::default();
        for (_, snapshot) in self.walk() {
            builder.push(
                ElementSnapshot::new(snapshot.tag.clone(), snapshot.id.clone())
                    .with_text(snapshot.text.clone()),
                snapshot.children.len(),
            );
        }
        builder.finish().unwrap_or_default()
    }
}

impl PartialEq for ElementSnapshot {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            if a.tag != b.tag
                || a.id != b.id
                || a.text != b.text
                || a.children.len() != b.children.len()
            {
                return false;
            }
            pending.extend(a.children.iter().zip(&b.children));
        }
        true
    }
}

impl Eq for ElementSnapshot {}

impl Drop for ElementSnapshot {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

/// Pre-order iterator returned by [`ElementSnapshot::walk`].
#[derive(Debug, Clone)]
pub struct SnapshotWalk<'a> {
    stack: Vec<(usize, &'a ElementSnapshot)>,
}

impl<'a> Iterator for SnapshotWalk<'a> {
    type Item = (usize, &'a ElementSnapshot);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, snapshot) = self.stack.pop()?;
        self.stack
            .extend(snapshot.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, snapshot))
    }
}

/// Assembles a snapshot from a pre-order stream of childless nodes, each
/// tagged with how many children follow it.
#[derive(Default)]
struct SnapshotBuilder {
    /// Open nodes with the number of children they still expect.
    stack: Vec<(ElementSnapshot, usize)>,
}

impl SnapshotBuilder {
    fn push(&mut self, node: ElementSnapshot, child_count: usize) {
        self.stack.push((node, child_count));
        while self.stack.len() > 1 && self.stack.last().is_some_and(|(_, left)| *left == 0) {
            self.close_last();
        }
    }

    fn close_last(&mut self) {
        let Some((done, _)) = self.stack.pop() else {
            return;
        };
        if let Some((parent, left)) = self.stack.last_mut() {
            parent.children.push(done);
            *left = left.saturating_sub(1);
        }
    }

    fn finish(mut self) -> Option<ElementSnapshot> {
        while self.stack.len() > 1 {
            self.close_last();
        }
        self.stack.pop().map(|(root, _)| root)
    }
}

/// A subtree removed by [`Document::delete_element`], with enough context
/// to reattach it where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSubtree {
    /// Id the parent had at removal time.
    pub parent_id: String,
    /// Index in the parent's children at removal time.
    pub position: usize,
    pub snapshot: ElementSnapshot,
}

impl RemovedSubtree {
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.parent_id.len() + self.snapshot.size_bytes()
    }
}
