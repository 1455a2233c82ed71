pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod formatter;
pub mod fs;
pub mod loader;
pub mod logging;
pub mod pattern;
pub mod source;

#[cfg(test)]
pub mod testutil;

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use tracing::debug;

use cli::Args;
use config::load_config;
use diagnostic::Diagnostic;
use formatter::listing::{write_instructions, write_tokens};
use formatter::{MatchOutcome, MatchReport, create_formatter};
use fs::discover_files;
use loader::{LoadError, load_files};
use pattern::{PatternError, Program, tokenize};
use source::SourceFile;

/// Run patlak. Returns the exit code: 0 = every input matched,
/// 1 = some input did not match, 2 = pattern files failed to load.
pub fn run(args: Args) -> Result<i32> {
    logging::init_logging(args.debug);

    let target_dir = args.paths.first().map(|p| {
        if p.is_file() {
            p.parent().unwrap_or(p)
        } else {
            p.as_path()
        }
    });
    let config = load_config(args.config.as_deref(), target_dir)?;
    match config.config_dir() {
        Some(dir) => debug!(dir = %dir.display(), "config loaded"),
        None => debug!("no config file found"),
    }

    let strict = args.strict || config.strict;
    let recursion_limit = args.recursion_limit.unwrap_or(config.recursion_limit);

    let files = discover_files(&args.paths, &config)?;
    debug!(files = files.len(), strict, recursion_limit, "discovered pattern files");

    // --tokens: list every file's tokens and exit
    if args.tokens {
        return print_tokens(&files);
    }

    let loaded = match load_files(&files, strict, recursion_limit) {
        Ok(loaded) => loaded,
        Err(LoadError::Invalid(diagnostic)) => {
            eprintln!("{diagnostic}");
            return Ok(2);
        }
        Err(LoadError::Read(err)) => return Err(err),
    };
    let program = &loaded.program;

    // --dump: print the instruction listing and exit
    if args.dump {
        let stdout = std::io::stdout();
        write_instructions(program, &mut stdout.lock())?;
        return Ok(0);
    }

    // --list: print registered names and exit
    if args.list {
        let mut stdout = std::io::stdout().lock();
        for name in program.registry().names() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(0);
    }

    let inputs = gather_inputs(&args)?;
    let outcomes: Vec<MatchOutcome> = match &args.pattern {
        Some(name) => {
            if program.lookup(name).is_none() {
                eprintln!("warning: no pattern named `{name}` is defined");
            }
            inputs
                .par_iter()
                .map(|input| match_input(program, name, input, args.search))
                .collect()
        }
        None if !inputs.is_empty() => bail!("inputs given without --pattern"),
        None => Vec::new(),
    };

    let report = MatchReport {
        files,
        pattern_count: program.registry().len(),
        diagnostics: loaded.warnings,
        outcomes,
    };
    debug!(
        inputs = report.outcomes.len(),
        matched = report.matched_count(),
        "matching done"
    );
    create_formatter(&args.format).print(&report);

    Ok(if report.all_matched() { 0 } else { 1 })
}

/// Match one input against `name`. With `search`, every suffix of the
/// input is tried in order and the first match is reported at its offset.
pub fn match_input(program: &Program, name: &str, input: &str, search: bool) -> MatchOutcome {
    let bytes = input.as_bytes();
    let last_offset = if search { bytes.len() } else { 0 };

    let mut outcome = MatchOutcome {
        pattern: name.to_string(),
        input: input.to_string(),
        offset: 0,
        matched: None,
        error: None,
    };
    for offset in 0..=last_offset {
        match program.matches(name, &bytes[offset..]) {
            Ok(Some(found)) => {
                outcome.offset = offset;
                outcome.matched = Some(String::from_utf8_lossy(found).into_owned());
                break;
            }
            Ok(None) => {}
            Err(err) => {
                outcome.offset = offset;
                outcome.error = Some(err.to_string());
                break;
            }
        }
    }
    outcome
}

fn gather_inputs(args: &Args) -> Result<Vec<String>> {
    let mut inputs = args.input.clone();
    if let Some(path) = &args.input_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        inputs.extend(text.lines().map(str::to_string));
    }
    if args.stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        inputs.extend(text.lines().map(str::to_string));
    }
    Ok(inputs)
}

fn print_tokens(files: &[std::path::PathBuf]) -> Result<i32> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for path in files {
        let source = SourceFile::from_path(path)?;
        match tokenize(source.as_str()) {
            Ok(tokens) => write_tokens(&source, &tokens, &mut out)?,
            Err(err) => {
                eprintln!("{}", Diagnostic::from_error(&source, &PatternError::from(err)));
                return Ok(2);
            }
        }
    }
    Ok(0)
}
