use std::io::Write;

use crate::formatter::{Formatter, MatchOutcome, MatchReport};

pub struct TextFormatter;

fn describe(outcome: &MatchOutcome) -> String {
    if let Some(err) = &outcome.error {
        return format!("error: {err}");
    }
    match &outcome.matched {
        Some(text) if outcome.offset > 0 => format!("{text:?} at {}", outcome.offset),
        Some(text) => format!("{text:?}"),
        None => "no match".to_string(),
    }
}

impl Formatter for TextFormatter {
    fn format_to(&self, report: &MatchReport, out: &mut dyn Write) {
        for d in &report.diagnostics {
            let _ = writeln!(out, "{d}");
        }
        for outcome in &report.outcomes {
            let _ = writeln!(
                out,
                "{}: {:?} -> {}",
                outcome.pattern,
                outcome.input,
                describe(outcome)
            );
        }

        let total = report.outcomes.len();
        let input_word = if total == 1 { "input" } else { "inputs" };
        let _ = writeln!(
            out,
            "\n{total} {input_word} checked, {} matched",
            report.matched_count(),
        );
    }
}
