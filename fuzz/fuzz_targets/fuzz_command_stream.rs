#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use treedit_core::{Document, ElementRef};
use treedit_runtime::{
    CommandExecutor, DocumentRenderer, DocumentStore, HistoryConfig, Session, SpellChecker,
    SpellIssue, StoreError,
};

struct Quiet;

impl DocumentRenderer for Quiet {
    fn render_tree(&self, _root: ElementRef<'_>) -> String {
        String::new()
    }

    fn render_indented(&self, _root: ElementRef<'_>, _indent: usize) -> String {
        String::new()
    }
}

impl SpellChecker for Quiet {
    fn check(&self, _root: ElementRef<'_>) -> Vec<SpellIssue> {
        Vec::new()
    }
}

impl DocumentStore for Quiet {
    fn read(&self, path: &Path) -> Result<Document, StoreError> {
        Err(StoreError::parse(path, 1, 1, "no files while fuzzing"))
    }

    fn write(&self, _doc: &Document, _path: &Path) -> Result<(), StoreError> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(script) = std::str::from_utf8(data) else {
        return;
    };
    if script.len() > 8192 {
        return;
    }

    let executor = CommandExecutor::new(Box::new(Quiet), Box::new(Quiet), Box::new(Quiet));
    let mut session = Session::new(HistoryConfig::unlimited());
    let start = session.document().snapshot();

    for line in script.lines() {
        if line.trim_start().starts_with("init") {
            continue;
        }
        if executor.execute_line(&mut session, line).is_err() {
            return;
        }
        let violations = session.document().integrity_violations();
        assert!(violations.is_empty(), "after {line:?}: {violations:?}");
    }

    // Unbounded history: undoing everything returns to the empty document.
    while let Some(result) = session.undo() {
        result.expect("undo of a recorded edit must apply");
    }
    assert_eq!(session.document().snapshot(), start);
});
