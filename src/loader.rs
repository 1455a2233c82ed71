//! Turning pattern files on disk into one `Program`.
//!
//! Files are read in parallel but compiled in path order, so a file's
//! definitions get the same code indices on every run. References may
//! cross files in either direction.

use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::diagnostic::Diagnostic;
use crate::pattern::{CompileError, Compiler, PatternError, Program};
use crate::source::SourceFile;

#[derive(Debug)]
pub struct LoadedPatterns {
    pub program: Program,
    pub sources: Vec<SourceFile>,
    /// Unresolved references, sorted by location.
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Read(#[from] anyhow::Error),
    /// A file failed to tokenize, parse or compile.
    #[error("{0}")]
    Invalid(Diagnostic),
}

#[tracing::instrument(level = "debug", skip_all, fields(files = paths.len(), strict = strict))]
pub fn load_files(
    paths: &[PathBuf],
    strict: bool,
    recursion_limit: usize,
) -> Result<LoadedPatterns, LoadError> {
    let sources = paths
        .par_iter()
        .map(|path| SourceFile::from_path(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    load_sources(sources, strict, recursion_limit)
}

/// Compile already-read sources. `Unresolved::origin` in the resulting
/// program indexes into `sources`.
pub fn load_sources(
    sources: Vec<SourceFile>,
    strict: bool,
    recursion_limit: usize,
) -> Result<LoadedPatterns, LoadError> {
    let mut compiler = Compiler::new();
    for (origin, source) in sources.iter().enumerate() {
        compiler.set_origin(origin);
        let compiled = compiler
            .compile_source(source.as_str())
            .map_err(|e| LoadError::Invalid(Diagnostic::from_error(source, &e)))?;
        debug!(path = source.path_str(), patterns = compiled.len(), "loaded");
    }

    let program = compiler
        .finish(strict)
        .map_err(|e| resolution_error(&sources, e))?
        .with_recursion_limit(recursion_limit);

    let mut warnings: Vec<Diagnostic> = program
        .unresolved()
        .iter()
        .filter_map(|u| sources.get(u.origin).map(|s| Diagnostic::unresolved(s, u)))
        .collect();
    warnings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    Ok(LoadedPatterns {
        program,
        sources,
        warnings,
    })
}

fn resolution_error(sources: &[SourceFile], err: CompileError) -> LoadError {
    let origin = match &err {
        CompileError::UnknownPattern { origin, .. } => *origin,
        _ => 0,
    };
    match sources.get(origin) {
        Some(source) => LoadError::Invalid(Diagnostic::from_error(source, &PatternError::from(err))),
        None => LoadError::Read(anyhow::Error::new(err)),
    }
}
