//! Pattern-definition language: lexer, parser, bytecode compiler, name
//! registry and NFA matcher.
//!
//! Sources are compiled in one batch through a [`Compiler`]; [`Compiler::finish`]
//! resolves cross-pattern references and yields an immutable [`Program`]
//! that can be matched against from any number of threads.

pub mod code;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod program;
pub mod registry;
pub mod span;
pub mod tree;

pub use code::{Code, CodeKind};
pub use compiler::{CompiledPattern, Compiler};
pub use error::{CompileError, LexError, MatchError, ParseError, PatternError};
pub use lexer::{Token, TokenKind, tokenize};
pub use matcher::{DEFAULT_RECURSION_LIMIT, MAX_RECURSION_LIMIT, Matcher};
pub use parser::{Parser, parse_definitions};
pub use program::{Program, Unresolved};
pub use registry::Registry;
pub use span::Span;
pub use tree::{ObjectKind, SyntaxNode, SyntaxTree};
