#![forbid(unsafe_code)]

//! A configured executor plus the session it drives.
//!
//! Scripts and the interactive loop share [`Editor::run_line`]: outcome
//! lines go to `out`, rejections go to `err`. They differ only in what a
//! fatal error does. A script stops at the first unknown command; the
//! interactive loop reports it and keeps reading.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{debug, info};
use treedit_core::Document;
use treedit_extras::{DictionaryChecker, FileStore, TreeRenderer};
use treedit_runtime::{
    CommandError, CommandExecutor, DocumentStore, EditorConfig, Outcome, Session,
};

use crate::error::{CliError, Result};

/// Interactive prompt.
pub const PROMPT: &str = "> ";

/// Counts for one pass over a command stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Lines that held a command.
    pub commands: usize,
    /// Commands refused without changing anything.
    pub rejected: usize,
}

pub struct Editor {
    executor: CommandExecutor,
    session: Session,
}

impl Editor {
    /// Build the collaborators named by `config` around a fresh document.
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        let mut checker = DictionaryChecker::new();
        if let Some(path) = &config.spell.dictionary {
            checker
                .load_words(path)
                .map_err(|source| CliError::Dictionary {
                    path: path.clone(),
                    source,
                })?;
        }

        let executor = CommandExecutor::new(
            Box::new(TreeRenderer::new(config.render.guides.into())),
            Box::new(checker),
            Box::new(FileStore::new()),
        )
        .with_default_indent(config.render.indent);

        Ok(Self {
            executor,
            session: Session::new(config.history_config()),
        })
    }

    /// Start from the document stored at `path` instead of an empty one.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let document: Document = FileStore::new().read(path)?;
        info!(
            path = %path.display(),
            elements = document.element_count(),
            "loaded input document"
        );
        self.session.replace_document(document);
        Ok(())
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one line. Returns the outcome, if the line held a command.
    pub fn run_line<W: Write, E: Write>(
        &mut self,
        line: &str,
        out: &mut W,
        err: &mut E,
    ) -> Result<std::result::Result<Option<Outcome>, CommandError>> {
        let outcome = match self.executor.execute_line(&mut self.session, line) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return Ok(Ok(None)),
            Err(error) => return Ok(Err(error)),
        };
        let sink: &mut dyn Write = if outcome.is_rejected() { err } else { out };
        for text in outcome.render_lines() {
            writeln!(sink, "{text}")?;
        }
        Ok(Ok(Some(outcome)))
    }

    /// Run every line of a script, stopping at the first fatal error.
    pub fn run_script<R: BufRead, W: Write, E: Write>(
        &mut self,
        input: R,
        out: &mut W,
        err: &mut E,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            match self.run_line(&line, out, err)? {
                Ok(Some(outcome)) => stats.record(&outcome),
                Ok(None) => {}
                Err(source) => {
                    return Err(CliError::Command {
                        line: index + 1,
                        source,
                    });
                }
            }
        }
        out.flush()?;
        debug!(commands = stats.commands, rejected = stats.rejected, "script finished");
        Ok(stats)
    }

    /// Prompt for lines until end of input.
    pub fn run_repl<R: BufRead, W: Write, E: Write>(
        &mut self,
        mut input: R,
        out: &mut W,
        err: &mut E,
    ) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let mut line = String::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            match self.run_line(line.trim_end_matches(['\r', '\n']), out, err)? {
                Ok(Some(outcome)) => stats.record(&outcome),
                Ok(None) => {}
                Err(error) => {
                    stats.commands += 1;
                    stats.rejected += 1;
                    writeln!(err, "Error: {error}")?;
                }
            }
        }
        out.flush()?;
        Ok(stats)
    }
}

impl RunStats {
    fn record(&mut self, outcome: &Outcome) {
        self.commands += 1;
        if outcome.is_rejected() {
            self.rejected += 1;
        }
    }
}
