//! Error types for loading and running patterns.
//!
//! Loading errors (lexing, parsing, compiling) carry the span they refer to
//! so callers can point at the offending source text. A failed match is not
//! an error: `run` reports it as `Ok(None)`.

use std::ascii;

use thiserror::Error;

use super::lexer::TokenKind;
use super::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated quote")]
    UnterminatedQuote { span: Span },
    #[error("empty quote literal")]
    EmptyQuote { span: Span },
    #[error("unknown escape sequence `\\{escape}`")]
    InvalidEscape { escape: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedQuote { span }
            | LexError::EmptyQuote { span }
            | LexError::InvalidEscape { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        span: Span,
    },
    #[error("pattern ends unexpectedly, expected {expected}")]
    UnexpectedEndOfPattern { expected: &'static str, span: Span },
    #[error("repeat count `{text}` does not fit in 32 bits")]
    InvalidNumber { text: String, span: Span },
    #[error("range bounds must be single characters")]
    InvalidRange { span: Span },
    #[error("group is never closed, expected `]`")]
    UnclosedGroup { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEndOfPattern { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::InvalidRange { span }
            | ParseError::UnclosedGroup { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Only raised when references are resolved strictly.
    #[error("reference to undefined pattern `{name}`")]
    UnknownPattern {
        name: String,
        span: Span,
        /// Index of the source the reference was compiled from.
        origin: usize,
    },
    #[error("repetition {{{min},{max}}} has a minimum larger than its maximum")]
    MalformedRepetition { min: u32, max: u32, span: Span },
    #[error("repetition count {count} exceeds the limit of {limit}")]
    RepetitionLimit { count: u32, limit: u32, span: Span },
    #[error("pattern expands to more than {limit} instructions")]
    PatternTooLarge { limit: usize, span: Span },
    #[error("range '{}'..'{}' has its lower bound above its upper bound", show_byte(.low), show_byte(.high))]
    InvertedRange { low: u8, high: u8, span: Span },
    #[error("pattern `{name}` is already defined")]
    DuplicatePattern { name: String, span: Span },
    #[error("syntax tree is not a pattern definition")]
    NotADefinition { span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::UnknownPattern { span, .. }
            | CompileError::MalformedRepetition { span, .. }
            | CompileError::RepetitionLimit { span, .. }
            | CompileError::PatternTooLarge { span, .. }
            | CompileError::InvertedRange { span, .. }
            | CompileError::DuplicatePattern { span, .. }
            | CompileError::NotADefinition { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("pattern references nest deeper than the limit of {limit}")]
    RecursionLimit { limit: usize },
}

/// Any error raised while turning pattern source into a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl PatternError {
    pub fn span(&self) -> Span {
        match self {
            PatternError::Lex(err) => err.span(),
            PatternError::Parse(err) => err.span(),
            PatternError::Compile(err) => err.span(),
        }
    }
}

/// Render a byte the way it would be written inside a quote.
pub(crate) fn show_byte(byte: &u8) -> String {
    ascii::escape_default(*byte).to_string()
}
