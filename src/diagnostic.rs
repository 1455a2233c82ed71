use std::fmt;

use crate::pattern::{PatternError, Span, Unresolved};
use crate::source::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// 1-indexed line number
    pub line: usize,
    /// 0-indexed column (characters within the line)
    pub column: usize,
}

/// A problem found while loading pattern files, pointing at source text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub path: String,
    pub location: Location,
    pub severity: Severity,
    pub message: String,
    /// The offending source line, when known.
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn from_span(
        source: &SourceFile,
        span: Span,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: source.path_str().to_string(),
            location: source.location(span),
            severity,
            message: message.into(),
            snippet: Some(source.line_text(span.start).to_string()),
        }
    }

    pub fn from_error(source: &SourceFile, err: &PatternError) -> Self {
        Self::from_span(source, err.span(), Severity::Error, err.to_string())
    }

    pub fn unresolved(source: &SourceFile, reference: &Unresolved) -> Self {
        Self::from_span(
            source,
            reference.span,
            Severity::Warning,
            format!("reference to undefined pattern `{}`", reference.name),
        )
    }

    pub fn sort_key(&self) -> (&str, usize, usize) {
        (&self.path, self.location.line, self.location.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.path, self.location.line, self.location.column, self.severity, self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::pattern::LexError;

    fn source(text: &str) -> SourceFile {
        SourceFile::from_string(PathBuf::from("lex.pat"), text.to_string())
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.letter(), 'E');
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic {
            path: "lex.pat".to_string(),
            location: Location { line: 3, column: 5 },
            severity: Severity::Error,
            message: "unterminated quote".to_string(),
            snippet: None,
        };
        assert_eq!(d.to_string(), "lex.pat:3:5: error: unterminated quote");
    }

    #[test]
    fn from_error_points_at_span() {
        let sf = source("digit = '0'..'9'\nkw = 'ab");
        let err = PatternError::Lex(LexError::UnterminatedQuote {
            span: Span::new(22, 25),
        });
        let d = Diagnostic::from_error(&sf, &err);
        assert_eq!(d.to_string(), "lex.pat:2:5: error: unterminated quote");
        assert_eq!(d.snippet.as_deref(), Some("kw = 'ab"));
    }

    #[test]
    fn unresolved_is_a_warning() {
        let sf = source("word = lettr");
        let d = Diagnostic::unresolved(
            &sf,
            &Unresolved {
                name: "lettr".into(),
                span: Span::new(7, 12),
                origin: 0,
            },
        );
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(
            d.to_string(),
            "lex.pat:1:7: warning: reference to undefined pattern `lettr`"
        );
    }

    #[test]
    fn diagnostic_sort_key() {
        let sf = source("a = x\nb = y");
        let d1 = Diagnostic::from_span(&sf, Span::new(4, 5), Severity::Warning, "m");
        let d2 = Diagnostic::from_span(&sf, Span::new(10, 11), Severity::Warning, "m");
        assert!(d1.sort_key() < d2.sort_key());
    }
}
