#![no_main]

use libfuzzer_sys::fuzz_target;
use treedit_core::Document;
use treedit_extras::html::{parse_document, write_document};

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    if src.len() > 16 * 1024 {
        return;
    }

    let Ok(snapshot) = parse_document(src) else {
        return;
    };
    // Duplicate explicit ids are a tree error, not a parser one.
    let Ok(doc) = Document::from_snapshot(&snapshot) else {
        return;
    };
    assert!(doc.integrity_violations().is_empty());

    // Whatever the reader accepts, the writer reproduces.
    let written = write_document(&doc);
    let reread = parse_document(&written).expect("written document must parse");
    assert_eq!(reread, doc.snapshot());
});
