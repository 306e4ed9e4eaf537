#![forbid(unsafe_code)]

//! Core: the element tree behind the treedit command editor.
//!
//! # Role in treedit
//! `treedit-core` owns the document. Elements carry a tag, a unique id,
//! text content, and ordered children. Everything that edits the tree goes
//! through [`Document`], which validates before it mutates.
//!
//! # Primary responsibilities
//! - **Document**: arena of elements with an id index and one root.
//! - **ElementRef**: borrowed read view used by renderers and checkers.
//! - **ElementSnapshot**: detached subtree copies, used to reverse deletes
//!   and as the persisted form of a document.
//! - **TreeError**: the structural error taxonomy.
//!
//! # How it fits in the system
//! `treedit-runtime` records edits against a [`Document`] and replays their
//! inverses for undo/redo. `treedit-extras` reads the tree through
//! [`ElementRef`] to render, spell-check, and save it.

pub mod document;
pub mod element;
pub mod error;

pub use document::{Document, ROOT_ID, ROOT_TAG};
pub use element::{
    Descendants, ElementRef, ElementSnapshot, NodeKey, RemovedSubtree, SnapshotWalk,
};
pub use error::{Result, TreeError, validate_id, validate_tag};
