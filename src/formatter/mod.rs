pub mod json;
pub mod listing;
pub mod text;

use std::io::Write;
use std::path::PathBuf;

use crate::diagnostic::Diagnostic;

/// Result of matching one input against one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub pattern: String,
    /// The input, lossily decoded for display.
    pub input: String,
    /// Byte offset the match starts at; non-zero only in search mode.
    pub offset: usize,
    pub matched: Option<String>,
    /// Set when matching aborted, e.g. on the recursion limit.
    pub error: Option<String>,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}

/// Everything a run reports: what was loaded and how each input fared.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub files: Vec<PathBuf>,
    pub pattern_count: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub outcomes: Vec<MatchOutcome>,
}

impl MatchReport {
    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_match()).count()
    }

    pub fn all_matched(&self) -> bool {
        self.outcomes.iter().all(MatchOutcome::is_match)
    }
}

pub trait Formatter {
    fn format_to(&self, report: &MatchReport, out: &mut dyn Write);

    fn print(&self, report: &MatchReport) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.format_to(report, &mut lock);
    }
}

pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        // "text" and any unknown value
        _ => Box::new(text::TextFormatter),
    }
}
