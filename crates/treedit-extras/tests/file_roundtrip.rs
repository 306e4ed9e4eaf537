#![forbid(unsafe_code)]

//! Save/read through the filesystem.
//!
//! Validates:
//! - HTML and JSON files reproduce the saved tree
//! - Hand-written HTML loads with generated ids
//! - Read failures leave the session untouched when driven by the executor
//! - Very deep documents read, render, and save without recursion

use std::path::Path;

use proptest::prelude::*;
use treedit_core::{Document, ElementSnapshot};
use treedit_extras::{DictionaryChecker, FileStore, TreeGuides, TreeRenderer};
use treedit_runtime::{CommandExecutor, DocumentStore, HistoryConfig, Outcome, Session, StoreError};

fn sample() -> Document {
    let mut doc = Document::new();
    doc.add_element("head", "head", "root", "").unwrap();
    doc.add_element("title", "title", "head", "Fish & Chips").unwrap();
    doc.add_element("body", "body", "root", "").unwrap();
    doc.add_element("p", "intro", "body", "Say \"hi\" <now>").unwrap();
    doc.add_element("ul", "list", "body", "").unwrap();
    doc.add_element("li", "i1", "list", "one").unwrap();
    doc.add_element("li", "i2", "list", "two\nlines").unwrap();
    doc.add_element("hr", "rule", "body", "").unwrap();
    doc
}

fn executor() -> CommandExecutor {
    CommandExecutor::new(
        Box::new(TreeRenderer::new(TreeGuides::Ascii)),
        Box::new(DictionaryChecker::new()),
        Box::new(FileStore::new()),
    )
}

#[test]
fn html_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    let doc = sample();

    FileStore.write(&doc, &path).unwrap();
    let back = FileStore.read(&path).unwrap();
    assert_eq!(back.snapshot(), doc.snapshot());
}

#[test]
fn json_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.json");
    let doc = sample();

    FileStore.write(&doc, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"id\": \"intro\""));

    let back = FileStore.read(&path).unwrap();
    assert_eq!(back.snapshot(), doc.snapshot());
}

#[test]
fn hand_written_html_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hand.html");
    std::fs::write(
        &path,
        "<!doctype html>
<html lang=\"en\">
  <body>
    <h1 class=\"big\">Welcome</h1>
    <p>First<br>line</p>
    <p id=\"p-1\">Explicit</p>
  </body>
</html>
",
    )
    .unwrap();

    let doc = FileStore.read(&path).unwrap();
    assert_eq!(doc.root_id(), "html-1");
    assert_eq!(doc.get_element_by_id("h1-1").unwrap().text(), "Welcome");
    assert!(doc.contains("br-1"));
    assert_eq!(doc.get_element_by_id("p-2").unwrap().text(), "First line");
    assert_eq!(doc.get_element_by_id("p-1").unwrap().text(), "Explicit");
    assert!(doc.integrity_violations().is_empty());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileStore.read(&dir.path().join("absent.html")).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }));
    assert!(err.to_string().contains("absent.html"));
}

#[test]
fn executor_save_then_read_resets_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.html");
    let exec = executor();
    let mut session = Session::new(HistoryConfig::default());

    let save = format!("save {}", treedit_runtime::quote(&path.display().to_string()));
    for line in [
        "append body b root",
        "append p p1 b 'Hello world'",
        save.as_str(),
        "edit-text p1 changed",
    ] {
        let outcome = exec.execute_line(&mut session, line).unwrap().unwrap();
        assert!(!outcome.is_rejected(), "{line}: {outcome}");
    }

    let read = format!("read {}", treedit_runtime::quote(&path.display().to_string()));
    assert_eq!(
        exec.execute_line(&mut session, &read).unwrap(),
        Some(Outcome::Done(None))
    );
    assert_eq!(
        session.document().get_element_by_id("p1").unwrap().text(),
        "Hello world"
    );
    assert!(!session.history().can_undo());
}

#[test]
fn executor_read_of_broken_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.html");
    std::fs::write(&path, "<html>\n  <p>\n</html>\n").unwrap();
    let exec = executor();
    let mut session = Session::new(HistoryConfig::default());
    exec.execute_line(&mut session, "insert p keep root").unwrap();

    let line = format!("read {}", treedit_runtime::quote(&path.display().to_string()));
    let outcome = exec.execute_line(&mut session, &line).unwrap().unwrap();
    let Outcome::Rejected(message) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(message.ends_with("broken.html:3:1: expected </p>, found </html>"), "{message}");
    assert!(session.document().contains("keep"));
    assert!(session.history().can_undo());
}

#[test]
fn executor_print_and_spell_check() {
    let exec = executor();
    let mut session = Session::new(HistoryConfig::default());
    exec.execute_line(&mut session, "insert p p1 root 'teh world'")
        .unwrap();

    let tree = exec.execute_line(&mut session, "print-tree").unwrap().unwrap();
    assert_eq!(tree, Outcome::Output("html#root\n`-- p#p1: teh world".into()));

    let issues = exec.execute_line(&mut session, "spell-check").unwrap().unwrap();
    assert_eq!(
        issues.render_lines(),
        vec!["Element p1: unknown word 'teh' (did you mean 'the'?)"]
    );
}

// ============================================================================
// Deep documents
// ============================================================================

fn nested_divs(depth: usize) -> String {
    format!("<html>{}{}</html>", "<div>".repeat(depth), "</div>".repeat(depth))
}

#[test]
fn deep_html_reads_and_renders() {
    const DEPTH: usize = 30_000;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.html");
    std::fs::write(&path, nested_divs(DEPTH)).unwrap();

    let exec = executor();
    let mut session = Session::new(HistoryConfig::default());
    let line = format!("read {}", treedit_runtime::quote(&path.display().to_string()));
    assert_eq!(
        exec.execute_line(&mut session, &line).unwrap(),
        Some(Outcome::Done(None))
    );
    let doc = session.document();
    assert_eq!(doc.element_count(), DEPTH + 1);
    assert!(doc.integrity_violations().is_empty());
    let deepest = doc.get_element_by_id(&format!("div-{DEPTH}")).unwrap();
    assert_eq!(deepest.depth(), DEPTH);

    let markup = treedit_extras::render::render_markup(doc.root(), 0);
    assert_eq!(markup.lines().count(), 2 * DEPTH + 1);

    let json = dir.path().join("deep.json");
    let line = format!("save {}", treedit_runtime::quote(&json.display().to_string()));
    let outcome = exec.execute_line(&mut session, &line).unwrap().unwrap();
    let Outcome::Rejected(message) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert!(message.contains("save as .html"), "{message}");
    assert!(!json.exists());
}

#[test]
fn deep_html_with_trailing_root_is_rejected() {
    let src = format!("{}<p></p>", nested_divs(30_000));
    let err = FileStore
        .decode(&src, Path::new("two-roots.html"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "{err}");
}

#[test]
fn deep_document_saves_as_html() {
    const DEPTH: usize = 1_500;
    let mut doc = Document::new();
    let mut parent = String::from("root");
    for i in 0..DEPTH {
        let id = format!("d{i}");
        doc.add_element("div", &id, &parent, "").unwrap();
        parent = id;
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.html");
    FileStore.write(&doc, &path).unwrap();
    let back = FileStore.read(&path).unwrap();
    assert!(back.snapshot() == doc.snapshot());
}

// ============================================================================
// Property: any editable tree survives HTML and JSON files
// ============================================================================

const IDS: &[&str] = &["a", "b", "c", "x&y", "q/1", "d-2", "e"];
const TAGS: &[&str] = &["div", "p", "span", "section", "my-widget"];

fn tree_strategy() -> impl Strategy<Value = Document> {
    let text = prop_oneof![
        Just(String::new()),
        "[A-Za-z<>&\"'/]{1,4}( [A-Za-z<>&]{1,4}){0,2}",
    ];
    prop::collection::vec((0..TAGS.len(), 0..IDS.len(), 0..=IDS.len(), text), 0..20).prop_map(
        |specs| {
            let mut doc = Document::new();
            for (tag, id, parent, text) in specs {
                let parent = IDS.get(parent).copied().unwrap_or("root");
                let _ = doc.add_element(TAGS[tag], IDS[id], parent, &text);
            }
            doc
        },
    )
}

fn roundtrip(doc: &Document, path: &Path) -> ElementSnapshot {
    FileStore.write(doc, path).unwrap();
    FileStore.read(path).unwrap().snapshot()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn saved_files_read_back_identically(doc in tree_strategy()) {
        let dir = tempfile::tempdir().unwrap();
        prop_assert_eq!(roundtrip(&doc, &dir.path().join("t.html")), doc.snapshot());
        prop_assert_eq!(roundtrip(&doc, &dir.path().join("t.json")), doc.snapshot());
    }
}
