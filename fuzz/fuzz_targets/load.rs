#![no_main]

use std::path::PathBuf;

use libfuzzer_sys::fuzz_target;
use patlak::loader::load_sources;
use patlak::source::SourceFile;

// First line is the input to match, the rest is pattern source.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (input, source) = text.split_once('\n').unwrap_or(("", text));
    let file = SourceFile::from_string(PathBuf::from("fuzz.pat"), source.to_string());
    let Ok(loaded) = load_sources(vec![file], false, 16) else {
        return;
    };
    for name in loaded.program.registry().names() {
        if let Ok(Some(found)) = loaded.program.matches(name, input.as_bytes()) {
            assert!(input.as_bytes().starts_with(found));
        }
    }
});
