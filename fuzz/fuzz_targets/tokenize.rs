#![no_main]

use libfuzzer_sys::fuzz_target;
use patlak::pattern::tokenize;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tokens) = tokenize(source) {
        // Token spans tile the source apart from whitespace
        let mut last = 0;
        for token in &tokens {
            assert!(token.span.start >= last && token.span.end <= source.len());
            assert!(source[last..token.span.start].bytes().all(|b| b.is_ascii_whitespace()));
            last = token.span.end;
        }
    }
});
