use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::pattern::{DEFAULT_RECURSION_LIMIT, MAX_RECURSION_LIMIT};

pub const CONFIG_FILE_NAME: &str = ".patlak.yml";

/// Settings read from `.patlak.yml`. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Deepest allowed nesting of pattern references while matching.
    pub recursion_limit: usize,
    /// Fail loading when a reference names an undefined pattern.
    pub strict: bool,
    /// Glob patterns skipped during directory discovery.
    pub exclude: Vec<String>,
    /// Directory the config file was loaded from, if any.
    #[serde(skip)]
    pub(crate) config_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            strict: false,
            exclude: Vec::new(),
            config_dir: None,
        }
    }
}

impl Config {
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }
}

/// Load the config at `path`, or `.patlak.yml` in `target_dir` (then the
/// working directory) when no path is given. A missing default file yields
/// the defaults; a missing explicit file is an error.
pub fn load_config(path: Option<&Path>, target_dir: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let candidates = target_dir
                .map(|dir| dir.join(CONFIG_FILE_NAME))
                .into_iter()
                .chain(std::iter::once(PathBuf::from(CONFIG_FILE_NAME)));
            match candidates.into_iter().find(|p| p.is_file()) {
                Some(found) => found,
                None => return Ok(Config::default()),
            }
        }
    };

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    config.config_dir = config_path
        .parent()
        .map(|dir| dir.to_path_buf())
        .filter(|dir| !dir.as_os_str().is_empty())
        .or_else(|| Some(PathBuf::from(".")));
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yml::from_str(contents)?;
    if !(1..=MAX_RECURSION_LIMIT).contains(&config.recursion_limit) {
        anyhow::bail!(
            "recursion_limit must be between 1 and {MAX_RECURSION_LIMIT}, got {}",
            config.recursion_limit
        );
    }
    Ok(config)
}
