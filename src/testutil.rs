use std::fs;
use std::path::{Path, PathBuf};

use crate::pattern::Program;

/// Compile `source`, panicking with the error if it does not load.
pub fn compile(source: &str) -> Program {
    match Program::compile(source) {
        Ok(program) => program,
        Err(err) => panic!("failed to compile {source:?}: {err} at {}", err.span()),
    }
}

/// Assert that `name` matches exactly `expected` as a prefix of `input`
/// (`None` meaning no match).
pub fn assert_matches(program: &Program, name: &str, input: &str, expected: Option<&str>) {
    let actual = match program.matches(name, input.as_bytes()) {
        Ok(found) => found.map(|m| String::from_utf8_lossy(m).into_owned()),
        Err(err) => panic!("matching {name} against {input:?} failed: {err}"),
    };
    assert_eq!(
        actual.as_deref(),
        expected,
        "pattern `{name}` against {input:?}"
    );
}

/// Assert that `name` matches each input in full.
pub fn assert_matches_all(program: &Program, name: &str, inputs: &[&str]) {
    for input in inputs {
        assert_matches(program, name, input, Some(input));
    }
}

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}
