#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use treedit_runtime::{CommandError, ConfigError, StoreError};

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for a command stream aborted by an unknown command.
pub const EXIT_UNKNOWN_COMMAND: i32 = 2;
/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("dictionary {}: {source}", .path.display())]
    Dictionary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input document: {0}")]
    Input(#[from] StoreError),

    #[error("script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A fatal command error; `line` is 1-based.
    #[error("line {line}: {source}")]
    Command {
        line: usize,
        #[source]
        source: CommandError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Command {
                source: CommandError::UnknownCommand { .. },
                ..
            } => EXIT_UNKNOWN_COMMAND,
            _ => EXIT_FAILURE,
        }
    }
}
