//! Pattern-definition parser.
//!
//! Builds one flat `SyntaxTree` per definition from the token stream:
//!
//! ```text
//! definition  := Identifier '=' alternation
//! alternation := sequence ('|' sequence)*
//! sequence    := postfix+
//! postfix     := unit ('?' | '*' | '+' | '{' n '}' | '{' n ',' m '}' | '{' n ',' '}')*
//! unit        := '.' | quote | quote '..' quote | Identifier | '[' alternation ']'
//! ```
//!
//! A sequence also ends where the next definition starts (`name =`).

use super::error::ParseError;
use super::lexer::{Token, TokenKind, unescape};
use super::span::Span;
use super::tree::{ObjectKind, SyntaxTree, TreeBuilder};

pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|token| token.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .map_or(0, |prev| self.tokens[prev].span.end)
    }

    fn end_of_pattern(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedEndOfPattern {
            expected,
            span: Span::empty(self.source.len()),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                expected,
                found: token.kind,
                span: token.span,
            },
            None => self.end_of_pattern(expected),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parse every definition in the token stream into one arena.
    pub fn parse_file(&mut self) -> Result<SyntaxTree, ParseError> {
        let mut b = TreeBuilder::new();
        while !self.at_end() {
            self.parse_definition(&mut b)?;
        }
        Ok(b.finish())
    }

    pub fn parse_definition(&mut self, b: &mut TreeBuilder) -> Result<(), ParseError> {
        let name = self.expect(TokenKind::Identifier, "pattern name")?;
        self.expect(TokenKind::Equal, "`=`")?;

        let root = b.add(ObjectKind::Definition, name.span);
        b.push();
        b.add(ObjectKind::Declaration, name.span);
        self.alternation(b, false)?;
        b.pop();
        b.set_span(root, Span::new(name.span.start, self.prev_end()));

        match self.peek_kind() {
            None | Some(TokenKind::Identifier) => Ok(()),
            Some(_) => Err(self.unexpected("pattern or next definition")),
        }
    }

    /// Parse `sequence ('|' sequence)*`.
    ///
    /// Several branches become an `Or` with one child per branch, each
    /// multi-item branch wrapped in a `Group`. A single branch is spliced
    /// into the current parent, wrapped in a `Group` only when
    /// `group_single` is set and it has several items.
    fn alternation(&mut self, b: &mut TreeBuilder, group_single: bool) -> Result<(), ParseError> {
        let first = b.len();
        let start = self.peek().map_or(self.source.len(), |token| token.span.start);
        let mut branches: Vec<(usize, u32, Span)> = Vec::new();

        loop {
            let branch_first = b.len();
            let branch_start = self.peek().map_or(self.source.len(), |token| token.span.start);
            let items = self.sequence(b)?;
            branches.push((
                branch_first,
                items,
                Span::new(branch_start, self.prev_end()),
            ));
            if self.peek_kind() == Some(TokenKind::Pipe) {
                self.advance();
            } else {
                break;
            }
        }

        let span = Span::new(start, self.prev_end());
        if branches.len() == 1 {
            let (_, items, _) = branches[0];
            if group_single && items > 1 {
                b.wrap(first, items, ObjectKind::Group, span);
            }
            return Ok(());
        }

        // Back to front, so earlier branch indices stay valid.
        for &(branch_first, items, branch_span) in branches.iter().rev() {
            if items > 1 {
                b.wrap(branch_first, items, ObjectKind::Group, branch_span);
            }
        }
        b.wrap(first, branches.len() as u32, ObjectKind::Or, span);
        Ok(())
    }

    fn sequence(&mut self, b: &mut TreeBuilder) -> Result<u32, ParseError> {
        let mut items = 0u32;
        while let Some(kind) = self.peek_kind() {
            if kind == TokenKind::Identifier && self.peek_nth_kind(1) == Some(TokenKind::Equal) {
                break;
            }
            if !starts_unit(kind) {
                break;
            }
            self.postfix(b)?;
            items += 1;
        }
        if items == 0 {
            return Err(self.unexpected("pattern"));
        }
        Ok(items)
    }

    fn postfix(&mut self, b: &mut TreeBuilder) -> Result<(), ParseError> {
        let first = b.len();
        let start = self.peek().map_or(self.source.len(), |token| token.span.start);
        self.unit(b)?;

        while let Some(kind) = self.peek_kind() {
            let repeat = match kind {
                TokenKind::Question => {
                    self.advance();
                    ObjectKind::RepeatRange { min: 0, max: 1 }
                }
                TokenKind::Star => {
                    self.advance();
                    ObjectKind::RepeatInfinite { min: 0 }
                }
                TokenKind::Plus => {
                    self.advance();
                    ObjectKind::RepeatInfinite { min: 1 }
                }
                TokenKind::OpenBrace => self.repeat_bounds()?,
                _ => break,
            };
            b.wrap(first, 1, repeat, Span::new(start, self.prev_end()));
        }
        Ok(())
    }

    /// `{n}`, `{n,m}` or `{n,}`, starting at the open brace.
    fn repeat_bounds(&mut self) -> Result<ObjectKind, ParseError> {
        self.expect(TokenKind::OpenBrace, "`{`")?;
        let min = self.number()?;

        let kind = if self.peek_kind() == Some(TokenKind::Comma) {
            self.advance();
            if self.peek_kind() == Some(TokenKind::Number) {
                let max = self.number()?;
                ObjectKind::RepeatRange { min, max }
            } else {
                ObjectKind::RepeatInfinite { min }
            }
        } else {
            ObjectKind::RepeatFixed(min)
        };

        self.expect(TokenKind::CloseBrace, "`}`")?;
        Ok(kind)
    }

    fn number(&mut self) -> Result<u32, ParseError> {
        let token = self.expect(TokenKind::Number, "number")?;
        let text = token.text(self.source);
        text.parse::<u32>().map_err(|_| ParseError::InvalidNumber {
            text: text.to_string(),
            span: token.span,
        })
    }

    fn unit(&mut self, b: &mut TreeBuilder) -> Result<(), ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.end_of_pattern("pattern"));
        };

        match token.kind {
            TokenKind::Dot => {
                self.advance();
                b.add(ObjectKind::LiteralWildcard, token.span);
            }
            TokenKind::Identifier => {
                self.advance();
                b.add(ObjectKind::LiteralReference, token.span);
            }
            TokenKind::Quote => self.quote(b)?,
            TokenKind::OpenBracket => self.group(b)?,
            _ => return Err(self.unexpected("pattern")),
        }
        Ok(())
    }

    /// A quote, or a range when two adjacent dots follow it.
    fn quote(&mut self, b: &mut TreeBuilder) -> Result<(), ParseError> {
        let Some(low_token) = self.advance() else {
            return Err(self.end_of_pattern("quoted literal"));
        };
        let low = unescape(low_token.text(self.source));

        if self.at_range_dots() {
            self.pos += 2;
            let high_token = self.expect(TokenKind::Quote, "quoted literal")?;
            let high = unescape(high_token.text(self.source));
            let span = low_token.span.to(high_token.span);
            let (&[low], &[high]) = (low.as_slice(), high.as_slice()) else {
                return Err(ParseError::InvalidRange { span });
            };
            b.add(ObjectKind::LiteralRange { low, high }, span);
            return Ok(());
        }

        let kind = match low.as_slice() {
            &[byte] => ObjectKind::LiteralCharacter(byte),
            _ => ObjectKind::LiteralString(low),
        };
        b.add(kind, low_token.span);
        Ok(())
    }

    fn at_range_dots(&self) -> bool {
        match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
            (Some(first), Some(second)) => {
                first.kind == TokenKind::Dot
                    && second.kind == TokenKind::Dot
                    && first.span.end == second.span.start
            }
            _ => false,
        }
    }

    fn group(&mut self, b: &mut TreeBuilder) -> Result<(), ParseError> {
        let open = self.expect(TokenKind::OpenBracket, "`[`")?;
        self.alternation(b, true)?;
        match self.peek_kind() {
            Some(TokenKind::CloseBracket) => {
                self.advance();
                Ok(())
            }
            Some(_) => Err(self.unexpected("`]`")),
            None => Err(ParseError::UnclosedGroup {
                span: Span::new(open.span.start, self.source.len()),
            }),
        }
    }
}

fn starts_unit(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Dot | TokenKind::Quote | TokenKind::Identifier | TokenKind::OpenBracket
    )
}

/// Parse a token stream into one tree per definition, in source order.
pub fn parse_definitions(source: &str, tokens: &[Token]) -> Result<Vec<SyntaxTree>, ParseError> {
    let arena = Parser::new(source, tokens).parse_file()?;
    Ok(arena
        .definitions()
        .map(|root| arena.copy_subtree(root))
        .collect())
}
