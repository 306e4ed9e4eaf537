#![forbid(unsafe_code)]

//! treedit Runtime
//!
//! This crate turns text commands into document edits and keeps the
//! history that makes them reversible.
//!
//! # Key Components
//!
//! - [`Command`] - Parsed editor command (closed set, typed fields)
//! - [`Session`] - One document plus its undo/redo stacks
//! - [`CommandExecutor`] - Dispatches commands and reports [`Outcome`]s
//! - [`HistoryManager`] - Bounded two-stack history of [`EditRecord`]s
//! - [`EditorConfig`] - TOML configuration
//!
//! # Role in treedit
//! `treedit-runtime` sits between `treedit-core`, which owns the tree, and
//! the collaborators in `treedit-extras`, which render, check, and persist
//! it through the traits in [`collab`].

pub mod collab;
pub mod command;
pub mod config;
pub mod executor;
pub mod session;
pub mod undo;

pub use collab::{DocumentRenderer, DocumentStore, SpellChecker, SpellIssue, StoreError};
pub use command::{COMMANDS, Command, CommandError, ElementSpec, MAX_INDENT, quote, tokenize};
pub use config::{ConfigError, EditorConfig, GuideStyle};
pub use executor::{CommandExecutor, Outcome};
pub use session::Session;
pub use undo::{EditRecord, HistoryConfig, HistoryManager, InsertKind};
