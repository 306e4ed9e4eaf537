#![no_main]

use libfuzzer_sys::fuzz_target;
use treedit_runtime::{Command, tokenize};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if line.len() > 4096 {
        return;
    }

    // Tokenizing and parsing must never panic.
    let _ = tokenize(line);
    let Ok(Some(command)) = Command::parse(line) else {
        return;
    };

    // A parsed command prints as a line that parses back to itself.
    let printed = command.to_string();
    let reparsed = Command::parse(&printed).expect("printed command must parse");
    assert_eq!(reparsed, Some(command), "roundtrip changed {printed:?}");
});
