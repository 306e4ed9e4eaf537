#![forbid(unsafe_code)]

//! Collaborators for the treedit runtime: rendering, spell-checking, and
//! file persistence. Each lives behind a feature (all on by default) and
//! implements one of the traits in `treedit_runtime::collab`.

#[cfg(feature = "render")]
pub mod render;

#[cfg(feature = "spell")]
pub mod spellcheck;

#[cfg(feature = "store")]
pub mod html;

#[cfg(feature = "store")]
pub mod store;

#[cfg(feature = "render")]
pub use render::{TreeGuides, TreeRenderer};
#[cfg(feature = "spell")]
pub use spellcheck::DictionaryChecker;
#[cfg(feature = "store")]
pub use store::{FileStore, JSON_MAX_DEPTH, StoreFormat};
