use std::io::Write;

use serde::Serialize;

use crate::formatter::{Formatter, MatchReport};

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: Metadata,
    diagnostics: Vec<JsonDiagnostic<'a>>,
    results: Vec<JsonResult<'a>>,
}

#[derive(Serialize)]
struct Metadata {
    files_loaded: usize,
    pattern_count: usize,
    input_count: usize,
    matched_count: usize,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    path: &'a str,
    line: usize,
    column: usize,
    severity: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    pattern: &'a str,
    input: &'a str,
    offset: usize,
    matched: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Formatter for JsonFormatter {
    fn format_to(&self, report: &MatchReport, out: &mut dyn Write) {
        let output = JsonOutput {
            metadata: Metadata {
                files_loaded: report.files.len(),
                pattern_count: report.pattern_count,
                input_count: report.outcomes.len(),
                matched_count: report.matched_count(),
            },
            diagnostics: report
                .diagnostics
                .iter()
                .map(|d| JsonDiagnostic {
                    path: &d.path,
                    line: d.location.line,
                    column: d.location.column,
                    severity: d.severity.label(),
                    message: &d.message,
                })
                .collect(),
            results: report
                .outcomes
                .iter()
                .map(|o| JsonResult {
                    pattern: &o.pattern,
                    input: &o.input,
                    offset: o.offset,
                    matched: o.matched.as_deref(),
                    error: o.error.as_deref(),
                })
                .collect(),
        };
        // Plain structs of strings and integers always serialize
        if let Ok(json) = serde_json::to_string_pretty(&output) {
            let _ = writeln!(out, "{json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, Location, Severity};
    use crate::formatter::tests::sample_report;

    fn render(report: &MatchReport) -> serde_json::Value {
        let mut buf = Vec::new();
        JsonFormatter.format_to(report, &mut buf);
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn empty_produces_valid_json() {
        let parsed = render(&MatchReport::default());
        assert_eq!(parsed["metadata"]["files_loaded"], 0);
        assert_eq!(parsed["metadata"]["input_count"], 0);
        assert_eq!(parsed["results"].as_array().unwrap().len(), 0);
        assert_eq!(parsed["diagnostics"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn results_fields() {
        let parsed = render(&sample_report());
        assert_eq!(parsed["metadata"]["pattern_count"], 2);
        assert_eq!(parsed["metadata"]["matched_count"], 1);
        let first = &parsed["results"][0];
        assert_eq!(first["pattern"], "digit");
        assert_eq!(first["input"], "42x");
        assert_eq!(first["matched"], "4");
        assert!(first.get("error").is_none());
        assert!(parsed["results"][1]["matched"].is_null());
    }

    #[test]
    fn diagnostics_fields() {
        let mut report = MatchReport::default();
        report.diagnostics.push(Diagnostic {
            path: "lex.pat".into(),
            location: Location { line: 2, column: 4 },
            severity: Severity::Warning,
            message: "reference to undefined pattern `x`".into(),
            snippet: None,
        });
        let parsed = render(&report);
        let d = &parsed["diagnostics"][0];
        assert_eq!(d["path"], "lex.pat");
        assert_eq!(d["line"], 2);
        assert_eq!(d["column"], 4);
        assert_eq!(d["severity"], "warning");
    }
}
