#![forbid(unsafe_code)]

//! Undo/redo history for document edits.
//!
//! Every mutating command that succeeds is stored as an [`EditRecord`]
//! carrying the state needed to reverse it. The [`HistoryManager`] keeps two
//! stacks of records and moves one record at a time between them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       HistoryManager                            │
//! │  ┌──────────────────┐          ┌──────────────────┐             │
//! │  │   past           │          │   future         │             │
//! │  │  ┌────────────┐  │          │  ┌────────────┐  │             │
//! │  │  │ RecordN    │  │  undo()  │  │ Record1    │  │             │
//! │  │  ├────────────┤  │ ──────►  │  ├────────────┤  │             │
//! │  │  │ Record2    │  │          │  │ Record2    │  │             │
//! │  │  ├────────────┤  │  ◄────── │  ├────────────┤  │             │
//! │  │  │ Record1    │  │  redo()  │  │ RecordN    │  │             │
//! │  │  └────────────┘  │          │  └────────────┘  │             │
//! │  └──────────────────┘          └──────────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - [`record`]: the closed set of reversible edits
//! - [`history`]: the bounded two-stack manager
//!
//! ## Memory Budget
//!
//! Every record reports its size via `size_bytes()`. Deletes carry the whole
//! removed subtree, so a byte budget sits alongside the depth limit:
//!
//! - Default: 100 records, 10MB history
//! - Oldest records evicted first

pub mod history;
pub mod record;

pub use history::{HistoryConfig, HistoryManager};
pub use record::{EditRecord, InsertKind};
