//! Pattern-definition lexer.
//!
//! Tokenizes definitions like `digit = '0'..'9'` into a flat token list.
//! Tokens only record spans; the text stays in the source.

use std::fmt;

use super::error::LexError;
use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Equal,        // =
    Dot,          // .
    Pipe,         // |
    Comma,        // ,
    Question,     // ?
    Star,         // *
    Plus,         // +
    OpenBrace,    // {
    CloseBrace,   // }
    OpenBracket,  // [
    CloseBracket, // ]
    Number,
    Quote,
    Identifier,
    Unknown,
}

/// One-byte marks. A mark's kind is the variant at the same position.
const MARKS: &[u8; 11] = b"=.|,?*+{}[]";

const MARK_KINDS: [TokenKind; 11] = [
    TokenKind::Equal,
    TokenKind::Dot,
    TokenKind::Pipe,
    TokenKind::Comma,
    TokenKind::Question,
    TokenKind::Star,
    TokenKind::Plus,
    TokenKind::OpenBrace,
    TokenKind::CloseBrace,
    TokenKind::OpenBracket,
    TokenKind::CloseBracket,
];

impl TokenKind {
    pub fn from_mark(byte: u8) -> Option<TokenKind> {
        MARKS
            .iter()
            .position(|&mark| mark == byte)
            .map(|index| MARK_KINDS[index])
    }

    pub fn is_mark(self) -> bool {
        MARK_KINDS.contains(&self)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = MARK_KINDS.iter().position(|kind| kind == self) {
            return write!(f, "`{}`", MARKS[index] as char);
        }
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::Quote => "quoted literal",
            TokenKind::Identifier => "identifier",
            _ => "unknown character",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.text(source)
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b'\t' | b'\n' | b' ') = self.peek() {
            self.pos += 1;
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn is_ident_byte(ch: u8) -> bool {
        ch.is_ascii_alphabetic() || ch == b'_'
    }

    /// Tokenize the whole source.
    ///
    /// Unrecognized input never stops the lexer: it becomes an `Unknown`
    /// token covering one character, so the result has at most one token per
    /// byte. Only malformed quotes are errors.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else { break };
            let start = self.pos;

            let kind = if let Some(kind) = TokenKind::from_mark(ch) {
                self.pos += 1;
                kind
            } else if ch.is_ascii_digit() {
                self.read_while(|c| c.is_ascii_digit());
                TokenKind::Number
            } else if ch == b'\'' {
                self.quote(start)?;
                TokenKind::Quote
            } else if Self::is_ident_byte(ch) {
                self.read_while(Self::is_ident_byte);
                TokenKind::Identifier
            } else {
                // Whole character, so spans stay on UTF-8 boundaries.
                let width = self.source[start..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.pos += width;
                TokenKind::Unknown
            };

            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
            });
        }

        Ok(tokens)
    }

    /// Consume a quote starting at `start`, through its closing `'`.
    fn quote(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 1;

        loop {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedQuote {
                        span: Span::new(start, self.pos),
                    });
                }
                Some(b'\\') => {
                    let Some(escaped) = self.source[self.pos + 1..].chars().next() else {
                        return Err(LexError::UnterminatedQuote {
                            span: Span::new(start, self.input.len()),
                        });
                    };
                    if !escaped.is_ascii() || escape_value(escaped as u8).is_none() {
                        return Err(LexError::InvalidEscape {
                            escape: escaped,
                            span: Span::new(self.pos, self.pos + 1 + escaped.len_utf8()),
                        });
                    }
                    self.pos += 2;
                }
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }

        if self.pos - start <= 2 {
            return Err(LexError::EmptyQuote {
                span: Span::new(start, self.pos),
            });
        }
        Ok(())
    }
}

/// Tokenize `source` in one pass.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// Value of the escape sequence `\<byte>`, if it is one.
fn escape_value(byte: u8) -> Option<u8> {
    match byte {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        b'\\' | b'\'' | b'"' => Some(byte),
        _ => None,
    }
}

/// Decode the bytes of a quote token, delimiters included in `quote`.
///
/// The lexer has already rejected unknown escapes, so decoding cannot fail.
pub fn unescape(quote: &str) -> Vec<u8> {
    let bytes = quote.as_bytes();
    let inner = &bytes[1..bytes.len() - 1];
    let mut out = Vec::with_capacity(inner.len());
    let mut iter = inner.iter().copied();

    while let Some(byte) = iter.next() {
        if byte == b'\\' {
            if let Some(escaped) = iter.next() {
                out.push(escape_value(escaped).unwrap_or(escaped));
            }
        } else {
            out.push(byte);
        }
    }

    out
}
