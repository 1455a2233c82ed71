//! Plain-text dumps: compiled instructions and source tokens.

use std::io::{self, Write};

use crate::pattern::{CodeKind, Program, Token};
use crate::source::SourceFile;

/// Write one line per instruction, with a `name:` header where each
/// pattern's body starts.
pub fn write_instructions(program: &Program, out: &mut dyn Write) -> io::Result<()> {
    let registry = program.registry();
    for (index, code) in program.codes().iter().enumerate() {
        if let Some(name) = registry.name_at(index) {
            writeln!(out, "{name}:")?;
        }
        let target = match code.kind {
            CodeKind::Empty | CodeKind::Literal(_) | CodeKind::Range(..)
                if code.movement != 1 =>
            {
                format!("  -> {}", index as isize + code.movement)
            }
            CodeKind::Reference(Some(start)) => registry
                .name_at(start)
                .map(|name| format!("  ({name})"))
                .unwrap_or_default(),
            _ => String::new(),
        };
        writeln!(out, "{index:>6}  {code}{target}")?;
    }
    Ok(())
}

/// Write one line per token: position, kind and source text.
pub fn write_tokens(source: &SourceFile, tokens: &[Token], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}:", source.path_str())?;
    for token in tokens {
        let (line, column) = source.offset_to_line_col(token.span.start);
        writeln!(
            out,
            "{:>4}:{:<4} {:<18} {}",
            line,
            column,
            token.kind.to_string(),
            token.text(source.as_str())
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::pattern::tokenize;

    fn instructions(source: &str) -> String {
        let program = Program::compile(source).unwrap();
        let mut buf = Vec::new();
        write_instructions(&program, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn headers_mark_pattern_starts() {
        let out = instructions("digit = '0'..'9' two = digit digit");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "digit:");
        assert!(lines[1].contains("range '0'..'9'"));
        assert!(lines[2].contains("terminal"));
        assert_eq!(lines[3], "two:");
        assert!(lines[4].ends_with("(digit)"));
    }

    #[test]
    fn jumps_show_targets() {
        let out = instructions("x = 'a' | 'b'");
        assert!(out.contains("branch 2"));
        // entry jump for the second branch lands on 'b'
        assert!(out.lines().any(|l| l.trim_start().starts_with("2  empty") && l.ends_with("-> 5")));
    }

    #[test]
    fn unresolved_reference_is_marked() {
        let out = instructions("x = missing");
        assert!(out.contains("reference <unresolved>"));
    }

    #[test]
    fn token_listing() {
        let sf = SourceFile::from_string(PathBuf::from("t.pat"), "d = '0'\n  | .".into());
        let tokens = tokenize(sf.as_str()).unwrap();
        let mut buf = Vec::new();
        write_tokens(&sf, &tokens, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "t.pat:");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("identifier") && lines[1].ends_with(" d"));
        assert!(lines[3].contains("quoted literal") && lines[3].ends_with("'0'"));
        assert!(lines[4].trim_start().starts_with("2:2"));
    }
}
