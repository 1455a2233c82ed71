//! Integration tests for the patlak pipeline.
//!
//! These write real pattern files and configs to a temp directory and go
//! through discovery, config loading, the loader and `run`.

use std::fs;
use std::path::{Path, PathBuf};

use patlak::cli::Args;
use patlak::config::{Config, load_config};
use patlak::diagnostic::Severity;
use patlak::fs::discover_files;
use patlak::loader::{LoadError, load_files};
use patlak::match_input;
use patlak::pattern::DEFAULT_RECURSION_LIMIT;

const LEXICON: &str = "\
letter = 'a'..'z' | 'A'..'Z' | '_'
digit  = '0'..'9'
ident  = letter [letter | digit]*
number = digit+ ['.' digit+]?
";

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn default_args(dir: &Path) -> Args {
    Args {
        paths: vec![dir.to_path_buf()],
        pattern: None,
        input: vec![],
        input_file: None,
        stdin: false,
        search: false,
        dump: false,
        tokens: false,
        list: false,
        format: "text".to_string(),
        config: None,
        strict: false,
        recursion_limit: None,
        debug: false,
    }
}

fn matching(dir: &Path, pattern: &str, inputs: &[&str]) -> Args {
    Args {
        pattern: Some(pattern.to_string()),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        ..default_args(dir)
    }
}

// ---------- Exit codes ----------

#[test]
fn run_all_inputs_match() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let code = patlak::run(matching(dir.path(), "ident", &["foo", "x9 = 1"])).unwrap();
    assert_eq!(code, 0);
}

#[test]
fn run_some_input_fails_to_match() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let code = patlak::run(matching(dir.path(), "number", &["42", "x"])).unwrap();
    assert_eq!(code, 1);
}

#[test]
fn run_syntax_error_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "good.pat", LEXICON);
    write_file(dir.path(), "bad.pat", "broken = 'a' |\n");
    let code = patlak::run(matching(dir.path(), "ident", &["foo"])).unwrap();
    assert_eq!(code, 2);
}

#[test]
fn run_undefined_pattern_is_no_match() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let code = patlak::run(matching(dir.path(), "float", &["1.5"])).unwrap();
    assert_eq!(code, 1);
}

#[test]
fn run_without_inputs_checks_files_only() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    assert_eq!(patlak::run(default_args(dir.path())).unwrap(), 0);
}

#[test]
fn run_inputs_need_a_pattern() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let args = Args {
        input: vec!["foo".to_string()],
        ..default_args(dir.path())
    };
    let err = patlak::run(args).unwrap_err();
    assert!(err.to_string().contains("--pattern"));
}

#[test]
fn run_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = default_args(&dir.path().join("nowhere"));
    let err = patlak::run(args).unwrap_err();
    assert!(err.to_string().contains("path does not exist"));
}

#[test]
fn run_listings_exit_0() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    for args in [
        Args { dump: true, ..default_args(dir.path()) },
        Args { list: true, ..default_args(dir.path()) },
        Args { tokens: true, ..default_args(dir.path()) },
    ] {
        assert_eq!(patlak::run(args).unwrap(), 0);
    }
}

#[test]
fn run_tokens_reports_lex_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "bad.pat", "x = 'oops\n");
    let args = Args {
        tokens: true,
        ..default_args(dir.path())
    };
    assert_eq!(patlak::run(args).unwrap(), 2);
}

#[test]
fn run_json_format() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let args = Args {
        format: "json".to_string(),
        ..matching(dir.path(), "digit", &["7"])
    };
    assert_eq!(patlak::run(args).unwrap(), 0);
}

#[test]
fn run_reads_input_file_lines() {
    let dir = tempfile::tempdir().unwrap();
    let patterns = write_file(dir.path(), "lex.pat", LEXICON);
    let inputs = write_file(dir.path(), "inputs.txt", "12\n3.5\nabc\n");
    let args = Args {
        paths: vec![patterns],
        input_file: Some(inputs),
        ..matching(dir.path(), "number", &[])
    };
    // "abc" is not a number
    assert_eq!(patlak::run(args).unwrap(), 1);
}

#[test]
fn run_search_finds_later_match() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let anchored = matching(dir.path(), "number", &["x = 42"]);
    assert_eq!(patlak::run(anchored).unwrap(), 1);
    let search = Args {
        search: true,
        ..matching(dir.path(), "number", &["x = 42"])
    };
    assert_eq!(patlak::run(search).unwrap(), 0);
}

// ---------- Strictness and config ----------

#[test]
fn strict_flag_rejects_unresolved_references() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "p.pat", "x = 'a' | missing\n");
    let lenient = matching(dir.path(), "x", &["a"]);
    assert_eq!(patlak::run(lenient).unwrap(), 0);
    let strict = Args {
        strict: true,
        ..matching(dir.path(), "x", &["a"])
    };
    assert_eq!(patlak::run(strict).unwrap(), 2);
}

#[test]
fn config_file_enables_strict() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "p.pat", "x = 'a' | missing\n");
    write_file(dir.path(), ".patlak.yml", "strict: true\n");
    assert_eq!(patlak::run(matching(dir.path(), "x", &["a"])).unwrap(), 2);
}

#[test]
fn config_recursion_limit_and_cli_override() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "p.pat", "nest = '(' nest? ')'\n");
    write_file(dir.path(), ".patlak.yml", "recursion_limit: 2\n");
    let deep = "((((()))))";
    // Exceeding the limit reports an error outcome, which is not a match
    assert_eq!(patlak::run(matching(dir.path(), "nest", &[deep])).unwrap(), 1);
    let raised = Args {
        recursion_limit: Some(64),
        ..matching(dir.path(), "nest", &[deep])
    };
    assert_eq!(patlak::run(raised).unwrap(), 0);
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    let args = Args {
        config: Some(dir.path().join("nope.yml")),
        ..default_args(dir.path())
    };
    let err = patlak::run(args).unwrap_err();
    assert!(err.to_string().contains("config file not found"));
}

#[test]
fn config_exclude_skips_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "lex.pat", LEXICON);
    write_file(dir.path(), "drafts/wip.pat", "wip = 'a' |\n");
    write_file(dir.path(), ".patlak.yml", "exclude:\n  - \"drafts/**\"\n");

    let config = load_config(None, Some(dir.path())).unwrap();
    let files = discover_files(&[dir.path().to_path_buf()], &config).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(patlak::run(matching(dir.path(), "digit", &["1"])).unwrap(), 0);
}

// ---------- Loader ----------

#[test]
fn references_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a_words.pat", "pair = ident ',' ident\n");
    write_file(dir.path(), "b_lex.pat", LEXICON);
    let files = discover_files(&[dir.path().to_path_buf()], &Config::default()).unwrap();
    let loaded = load_files(&files, true, DEFAULT_RECURSION_LIMIT).unwrap();
    assert!(loaded.warnings.is_empty());
    assert_eq!(
        loaded.program.matches("pair", b"ab,c9;").unwrap(),
        Some(&b"ab,c9"[..])
    );
}

#[test]
fn unresolved_reference_warning_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "p.pat", "digit = '0'..'9'\npair = digit sep digit\n");
    let loaded = load_files(&[path.clone()], false, DEFAULT_RECURSION_LIMIT).unwrap();
    assert_eq!(loaded.warnings.len(), 1);
    let warning = &loaded.warnings[0];
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.path, path.to_str().unwrap());
    assert_eq!((warning.location.line, warning.location.column), (2, 13));
    assert_eq!(warning.snippet.as_deref(), Some("pair = digit sep digit"));
}

#[test]
fn compile_error_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "p.pat", "ok = 'a'\nbad = 'z'..'a'\n");
    let err = load_files(&[path], false, DEFAULT_RECURSION_LIMIT).unwrap_err();
    let LoadError::Invalid(diagnostic) = err else {
        panic!("expected a diagnostic, got {err:?}");
    };
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.location.line, 2);
    assert!(diagnostic.message.contains("lower bound above its upper bound"));
}

#[test]
fn empty_pattern_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "empty.pat", "\n\n");
    let loaded = load_files(&[path], true, DEFAULT_RECURSION_LIMIT).unwrap();
    assert!(loaded.program.registry().is_empty());
}

#[test]
fn non_utf8_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bin.pat");
    fs::write(&path, [b'x', b' ', b'=', 0xff]).unwrap();
    let err = load_files(&[path], false, DEFAULT_RECURSION_LIMIT).unwrap_err();
    assert!(matches!(err, LoadError::Read(_)));
}

// ---------- match_input ----------

#[test]
fn match_input_search_offsets() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "lex.pat", LEXICON);
    let program = load_files(&[path], true, DEFAULT_RECURSION_LIMIT).unwrap().program;

    let outcome = match_input(&program, "number", "x = 3.25;", true);
    assert_eq!(outcome.offset, 4);
    assert_eq!(outcome.matched.as_deref(), Some("3.25"));

    let outcome = match_input(&program, "number", "x = 3.25;", false);
    assert!(!outcome.is_match());
    assert_eq!(outcome.offset, 0);

    let outcome = match_input(&program, "number", "none here", true);
    assert!(!outcome.is_match());
    assert!(outcome.error.is_none());
}

#[test]
fn match_input_reports_recursion_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "p.pat", "loop = loop 'a'\n");
    let program = load_files(&[path], false, 4).unwrap().program;
    let outcome = match_input(&program, "loop", "aaa", false);
    assert!(!outcome.is_match());
    assert!(outcome.error.unwrap().contains("limit of 4"));
}
