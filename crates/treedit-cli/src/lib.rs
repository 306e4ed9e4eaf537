#![forbid(unsafe_code)]

//! Command-line front end for treedit.
//!
//! `treedit run <script>` executes a command file; `treedit repl` reads
//! commands from stdin. Both can start from an existing document with
//! `--input`, and both take a TOML `--config`.

pub mod cli;
pub mod editor;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands, run, run_from_env};
pub use editor::{Editor, RunStats};
pub use error::{CliError, Result};
