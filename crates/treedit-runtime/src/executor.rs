#![forbid(unsafe_code)]

//! Command dispatch.
//!
//! [`CommandExecutor`] maps each [`Command`] to a session operation or a
//! collaborator call and turns the result into an [`Outcome`]. Structural
//! errors never escape as `Err`: they become a rejected status line and the
//! session is left unchanged. The only error surfaced to the caller is a
//! fatal parse error from [`CommandExecutor::execute_line`].

use std::fmt;

use tracing::{debug, info};
use treedit_core::{Document, TreeError};

use crate::collab::{DocumentRenderer, DocumentStore, SpellChecker, SpellIssue};
use crate::command::{Command, CommandError, ElementSpec};
use crate::session::Session;
use crate::undo::InsertKind;

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command took effect, optionally with a status line.
    Done(Option<String>),
    /// The command was refused; nothing changed.
    Rejected(String),
    /// Rendered text from a query command.
    Output(String),
    /// Spell-check findings, in document order.
    Issues(Vec<SpellIssue>),
}

impl Outcome {
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Lines to show the user, in order.
    #[must_use]
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            Self::Done(None) => Vec::new(),
            Self::Done(Some(line)) | Self::Rejected(line) => vec![line.clone()],
            Self::Output(text) => text.lines().map(str::to_owned).collect(),
            Self::Issues(issues) => issues
                .iter()
                .map(|issue| format!("Element {}: {}", issue.element_id, issue.message))
                .collect(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_lines().join("\n"))
    }
}

fn rejected(err: impl fmt::Display) -> Outcome {
    Outcome::Rejected(format!("Error: {err}"))
}

/// Runs commands against a [`Session`] using pluggable collaborators.
pub struct CommandExecutor {
    renderer: Box<dyn DocumentRenderer>,
    checker: Box<dyn SpellChecker>,
    store: Box<dyn DocumentStore>,
    default_indent: usize,
}

impl fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("default_indent", &self.default_indent)
            .finish_non_exhaustive()
    }
}

impl CommandExecutor {
    pub fn new(
        renderer: Box<dyn DocumentRenderer>,
        checker: Box<dyn SpellChecker>,
        store: Box<dyn DocumentStore>,
    ) -> Self {
        Self {
            renderer,
            checker,
            store,
            default_indent: 2,
        }
    }

    /// Indent used by `print-indent` without an argument.
    #[must_use]
    pub fn with_default_indent(mut self, indent: usize) -> Self {
        self.default_indent = indent;
        self
    }

    /// Parse and run one line.
    ///
    /// Returns `Ok(None)` for blank and comment lines. Recoverable parse
    /// errors come back as [`Outcome::Rejected`]; only a fatal error
    /// (unknown command) is returned as `Err`.
    pub fn execute_line(
        &self,
        session: &mut Session,
        line: &str,
    ) -> Result<Option<Outcome>, CommandError> {
        match Command::parse(line) {
            Ok(Some(command)) => Ok(Some(self.execute(session, command))),
            Ok(None) => Ok(None),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                debug!(line, error = %err, "rejected");
                Ok(Some(rejected(err)))
            }
        }
    }

    /// Run a parsed command.
    pub fn execute(&self, session: &mut Session, command: Command) -> Outcome {
        let name = command.name();
        let outcome = match command {
            Command::Insert(spec) => Self::add(session, InsertKind::Insert, spec),
            Command::Append(spec) => Self::add(session, InsertKind::Append, spec),
            Command::Delete { id } => Self::edited(session.delete(&id).map(|_| ())),
            Command::EditText { id, text } => Self::edited(session.edit_text(&id, &text)),
            Command::EditId { old_id, new_id } => Self::edited(session.edit_id(&old_id, &new_id)),
            Command::Undo => match session.undo() {
                None => Outcome::Done(Some("Nothing to undo.".into())),
                Some(Ok(description)) => Outcome::Done(Some(format!("Undo: {description}"))),
                Some(Err(err)) => rejected(err),
            },
            Command::Redo => match session.redo() {
                None => Outcome::Done(Some("Nothing to redo.".into())),
                Some(Ok(description)) => Outcome::Done(Some(format!("Redo: {description}"))),
                Some(Err(err)) => rejected(err),
            },
            Command::Init => {
                session.replace_document(Document::new());
                Outcome::Done(Some("Initialized HTML model.".into()))
            }
            Command::Read { path } => match self.store.read(&path) {
                Ok(document) => {
                    info!(path = %path.display(), "read document");
                    session.replace_document(document);
                    Outcome::Done(None)
                }
                Err(err) => rejected(err),
            },
            Command::Save { path } => match self.store.write(session.document(), &path) {
                Ok(()) => {
                    info!(
                        path = %path.display(),
                        elements = session.document().element_count(),
                        "saved document"
                    );
                    Outcome::Done(None)
                }
                Err(err) => rejected(err),
            },
            Command::PrintTree => {
                Outcome::Output(self.renderer.render_tree(session.document().root()))
            }
            Command::PrintIndent { indent } => Outcome::Output(self.renderer.render_indented(
                session.document().root(),
                indent.unwrap_or(self.default_indent),
            )),
            Command::SpellCheck => Outcome::Issues(self.checker.check(session.document().root())),
        };

        match &outcome {
            Outcome::Rejected(message) => debug!(command = name, %message, "rejected"),
            _ => debug!(
                command = name,
                undo_depth = session.history().undo_depth(),
                redo_depth = session.history().redo_depth(),
                "executed"
            ),
        }
        outcome
    }

    /// `insert` and `append` share validation and error reporting; only
    /// `append` announces success.
    fn add(session: &mut Session, kind: InsertKind, spec: ElementSpec) -> Outcome {
        let status = match kind {
            InsertKind::Insert => None,
            InsertKind::Append => Some(format!(
                "Appended {} with id '{}' to parent element with id '{}'.",
                spec.tag, spec.id, spec.parent_id
            )),
        };
        match session.insert(kind, spec) {
            Ok(()) => Outcome::Done(status),
            Err(err) => rejected(err),
        }
    }

    fn edited(result: Result<(), TreeError>) -> Outcome {
        match result {
            Ok(()) => Outcome::Done(None),
            Err(err) => rejected(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use treedit_core::ElementRef;

    use super::*;
    use crate::collab::StoreError;
    use crate::undo::HistoryConfig;

    struct IdRenderer;

    impl DocumentRenderer for IdRenderer {
        fn render_tree(&self, root: ElementRef<'_>) -> String {
            root.descendants()
                .map(|e| format!("{}{}", "  ".repeat(e.depth()), e.id()))
                .collect::<Vec<_>>()
                .join("\n")
        }

        fn render_indented(&self, root: ElementRef<'_>, indent: usize) -> String {
            format!("{}:{indent}", root.id())
        }
    }

    struct TypoChecker;

    impl SpellChecker for TypoChecker {
        fn check(&self, root: ElementRef<'_>) -> Vec<SpellIssue> {
            root.descendants()
                .filter(|e| e.text().contains("teh"))
                .map(|e| SpellIssue::new(e.id(), "unknown word 'teh'"))
                .collect()
        }
    }

    struct NoStore;

    impl DocumentStore for NoStore {
        fn read(&self, path: &Path) -> Result<Document, StoreError> {
            Err(StoreError::parse(path, 1, 1, "nothing here"))
        }

        fn write(&self, _doc: &Document, _path: &Path) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn executor() -> CommandExecutor {
        CommandExecutor::new(Box::new(IdRenderer), Box::new(TypoChecker), Box::new(NoStore))
    }

    fn run(exec: &CommandExecutor, session: &mut Session, line: &str) -> Outcome {
        exec.execute_line(session, line)
            .expect("line should not be fatal")
            .expect("line should carry a command")
    }

    #[test]
    fn test_append_reports_success_and_duplicate() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());

        assert_eq!(
            run(&exec, &mut s, "append p p1 root Hi"),
            Outcome::Done(Some(
                "Appended p with id 'p1' to parent element with id 'root'.".into()
            ))
        );
        assert_eq!(
            run(&exec, &mut s, "append p p1 root Bye"),
            Outcome::Rejected("Error: An element with id 'p1' already exists.".into())
        );
        assert_eq!(s.document().get_element_by_id("p1").unwrap().text(), "Hi");
        assert_eq!(s.history().undo_depth(), 1);
    }

    #[test]
    fn test_insert_is_silent_and_shares_errors() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        assert_eq!(run(&exec, &mut s, "insert div d1 root"), Outcome::Done(None));
        assert_eq!(
            run(&exec, &mut s, "insert div d2 missing"),
            Outcome::Rejected("Error: Parent element with id 'missing' not found.".into())
        );
    }

    #[test]
    fn test_undo_redo_status_lines() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        assert_eq!(
            run(&exec, &mut s, "undo"),
            Outcome::Done(Some("Nothing to undo.".into()))
        );
        run(&exec, &mut s, "insert span s1 root a");
        assert_eq!(
            run(&exec, &mut s, "undo"),
            Outcome::Done(Some("Undo: insert span#s1 under root".into()))
        );
        assert_eq!(
            run(&exec, &mut s, "redo"),
            Outcome::Done(Some("Redo: insert span#s1 under root".into()))
        );
        assert_eq!(
            run(&exec, &mut s, "redo"),
            Outcome::Done(Some("Nothing to redo.".into()))
        );
    }

    #[test]
    fn test_queries_are_not_recorded() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        run(&exec, &mut s, "insert p p1 root teh");
        run(&exec, &mut s, "undo");
        for line in ["print-tree", "print-indent 4", "spell-check", "save out.html"] {
            run(&exec, &mut s, line);
        }
        assert_eq!(s.history().undo_depth(), 0);
        assert!(s.history().can_redo(), "queries must not clear redo");
    }

    #[test]
    fn test_print_indent_uses_default_width() {
        let exec = executor().with_default_indent(3);
        let mut s = Session::new(HistoryConfig::default());
        assert_eq!(run(&exec, &mut s, "print-indent"), Outcome::Output("root:3".into()));
        assert_eq!(run(&exec, &mut s, "print-indent 0"), Outcome::Output("root:0".into()));
    }

    #[test]
    fn test_spell_issue_lines() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        run(&exec, &mut s, "insert p p1 root 'teh cat'");
        let outcome = run(&exec, &mut s, "spell-check");
        assert_eq!(outcome.render_lines(), vec!["Element p1: unknown word 'teh'"]);
    }

    #[test]
    fn test_failed_read_keeps_document_and_history() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        run(&exec, &mut s, "insert p p1 root");
        let outcome = run(&exec, &mut s, "read broken.html");
        assert_eq!(
            outcome,
            Outcome::Rejected("Error: broken.html:1:1: nothing here".into())
        );
        assert!(s.document().contains("p1"));
        assert_eq!(s.history().undo_depth(), 1);
    }

    #[test]
    fn test_init_resets_history() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        run(&exec, &mut s, "insert p p1 root");
        assert_eq!(
            run(&exec, &mut s, "init"),
            Outcome::Done(Some("Initialized HTML model.".into()))
        );
        assert!(!s.document().contains("p1"));
        assert!(!s.history().can_undo());
    }

    #[test]
    fn test_unknown_command_is_fatal_but_arity_is_not() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        assert!(exec.execute_line(&mut s, "bogus").unwrap_err().is_fatal());
        assert!(run(&exec, &mut s, "delete").is_rejected());
        assert_eq!(exec.execute_line(&mut s, "# note").unwrap(), None);
    }

    #[test]
    fn test_delete_root_is_rejected() {
        let exec = executor();
        let mut s = Session::new(HistoryConfig::default());
        let outcome = run(&exec, &mut s, "delete root");
        assert!(outcome.is_rejected());
        assert_eq!(s.document().element_count(), 1);
    }
}
