#![forbid(unsafe_code)]

//! Structural errors raised by the element tree.
//!
//! Every variant is recoverable: an operation that fails leaves the tree
//! exactly as it was. The `Display` text is the user-facing status line.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("An element with id '{id}' already exists.")]
    DuplicateId { id: String },

    #[error("Parent element with id '{id}' not found.")]
    ParentNotFound { id: String },

    #[error("Element with id '{id}' not found.")]
    NotFound { id: String },

    #[error("The root element '{id}' cannot be deleted.")]
    CannotDeleteRoot { id: String },

    #[error("Invalid element id '{id}': ids must be non-empty and contain no whitespace.")]
    InvalidId { id: String },

    #[error(
        "Invalid tag '{tag}': tags start with a letter and use only \
         letters, digits, '-', '_' or ':'."
    )]
    InvalidTag { tag: String },
}

impl TreeError {
    /// The element id (or tag) the error is about.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::DuplicateId { id }
            | Self::ParentNotFound { id }
            | Self::NotFound { id }
            | Self::CannotDeleteRoot { id }
            | Self::InvalidId { id } => id,
            Self::InvalidTag { tag } => tag,
        }
    }

    pub(crate) fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub(crate) fn parent_not_found(id: impl Into<String>) -> Self {
        Self::ParentNotFound { id: id.into() }
    }
}

/// Reject empty ids and ids containing whitespace.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(TreeError::InvalidId { id: id.to_owned() });
    }
    Ok(())
}

/// Tags follow HTML element-name shape: a letter, then letters, digits, `-`, `_` or `:`.
pub fn validate_tag(tag: &str) -> Result<()> {
    let mut chars = tag.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TreeError::InvalidTag {
            tag: tag.to_owned(),
        })
    }
}
