use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;

use crate::config::Config;

pub const PATTERN_EXTENSION: &str = "pat";

/// Expand `paths` into the pattern files to load, in the order they get
/// compiled. Named files are kept whatever their extension; directories
/// contribute their `*.pat` files minus gitignored and excluded ones.
pub fn discover_files(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(pattern_files_under(path, &config.exclude)?);
        } else {
            anyhow::bail!("path does not exist: {}", path.display());
        }
    }

    // Code indices follow load order, so keep it stable across runs.
    files.sort();
    files.dedup();
    Ok(files)
}

fn pattern_files_under(root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let mut walker = WalkBuilder::new(root);
    walker.hidden(true).git_ignore(true).git_global(true);

    if !exclude.is_empty() {
        let mut overrides = OverrideBuilder::new(root);
        for glob in exclude {
            // a leading `!` turns an override into an ignore rule
            overrides
                .add(&format!("!{glob}"))
                .with_context(|| format!("invalid exclude glob: {glob}"))?;
        }
        walker.overrides(overrides.build().context("failed to build exclude globs")?);
    }

    let mut found = Vec::new();
    for entry in walker.build() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let is_pattern = entry.file_type().is_some_and(|t| t.is_file())
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == PATTERN_EXTENSION);
        if is_pattern {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
