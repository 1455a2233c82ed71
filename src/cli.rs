use std::path::PathBuf;

use clap::Parser;

use crate::pattern::MAX_RECURSION_LIMIT;

#[derive(Parser, Debug)]
#[command(
    name = "patlak",
    version,
    about = "Compile pattern definitions and match inputs against them"
)]
pub struct Args {
    /// Pattern files (*.pat) or directories to load
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Pattern to match inputs against
    #[arg(short, long, value_name = "NAME")]
    pub pattern: Option<String>,

    /// Input to match (repeatable)
    #[arg(short, long, value_name = "TEXT")]
    pub input: Vec<String>,

    /// Match every line of FILE
    #[arg(long, value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Match every line of standard input
    #[arg(long)]
    pub stdin: bool,

    /// Try every suffix of each input instead of anchoring at its start
    #[arg(long)]
    pub search: bool,

    /// Print the compiled instruction listing, then exit
    #[arg(long)]
    pub dump: bool,

    /// Print the token listing of each pattern file, then exit
    #[arg(long)]
    pub tokens: bool,

    /// List registered pattern names, one per line, then exit
    #[arg(long)]
    pub list: bool,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Path to configuration file [default: .patlak.yml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat references to undefined patterns as errors
    #[arg(long)]
    pub strict: bool,

    /// Deepest allowed nesting of pattern references while matching
    #[arg(long, value_name = "N", value_parser = parse_recursion_limit)]
    pub recursion_limit: Option<usize>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

fn parse_recursion_limit(value: &str) -> Result<usize, String> {
    let limit: usize = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if !(1..=MAX_RECURSION_LIMIT).contains(&limit) {
        return Err(format!("must be between 1 and {MAX_RECURSION_LIMIT}"));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["patlak"]);
        assert_eq!(args.paths, vec![PathBuf::from(".")]);
        assert_eq!(args.format, "text");
        assert!(args.pattern.is_none());
        assert!(args.input.is_empty());
        assert!(!args.strict && !args.search && !args.dump);
    }

    #[test]
    fn repeated_inputs() {
        let args = Args::parse_from([
            "patlak", "lex.pat", "-p", "digit", "-i", "42", "--input", "x",
        ]);
        assert_eq!(args.pattern.as_deref(), Some("digit"));
        assert_eq!(args.input, vec!["42", "x"]);
        assert_eq!(args.paths, vec![PathBuf::from("lex.pat")]);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Args::try_parse_from(["patlak", "-f", "xml"]).is_err());
    }

    #[test]
    fn recursion_limit_is_numeric() {
        let args = Args::try_parse_from(["patlak", "--recursion-limit", "9"]).unwrap();
        assert_eq!(args.recursion_limit, Some(9));
        assert!(Args::try_parse_from(["patlak", "--recursion-limit", "deep"]).is_err());
    }

    #[test]
    fn recursion_limit_is_bounded() {
        assert!(Args::try_parse_from(["patlak", "--recursion-limit", "1000000"]).is_err());
        assert!(Args::try_parse_from(["patlak", "--recursion-limit", "0"]).is_err());
        let args = Args::try_parse_from(["patlak", "--recursion-limit", "512"]).unwrap();
        assert_eq!(args.recursion_limit, Some(MAX_RECURSION_LIMIT));
    }
}
