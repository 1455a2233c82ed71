use super::code::Code;
use super::compiler::Compiler;
use super::error::{MatchError, PatternError};
use super::matcher::{DEFAULT_RECURSION_LIMIT, MAX_RECURSION_LIMIT, Matcher};
use super::registry::Registry;
use super::span::Span;

/// A reference left dangling after the batch was compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub name: String,
    pub span: Span,
    /// Index of the source the reference was compiled from.
    pub origin: usize,
}

/// A finished batch of compiled patterns.
///
/// Immutable once built, so it can be shared across threads and matched
/// against concurrently.
#[derive(Debug, Clone)]
pub struct Program {
    codes: Vec<Code>,
    registry: Registry,
    unresolved: Vec<Unresolved>,
    recursion_limit: usize,
}

impl Program {
    pub(crate) fn new(codes: Vec<Code>, registry: Registry, unresolved: Vec<Unresolved>) -> Self {
        Self {
            codes,
            registry,
            unresolved,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Compile a single source, leaving undefined references dead.
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let mut compiler = Compiler::new();
        compiler.compile_source(source)?;
        Ok(compiler.finish(false)?)
    }

    /// Set the nesting limit for matches, clamped to `MAX_RECURSION_LIMIT`.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit.min(MAX_RECURSION_LIMIT);
        self
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn unresolved(&self) -> &[Unresolved] {
        &self.unresolved
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.registry.lookup(name)
    }

    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.codes).with_recursion_limit(self.recursion_limit)
    }

    /// Match the pattern `name` against a prefix of `input`.
    ///
    /// An unknown name is no match, not an error.
    pub fn matches<'i>(&self, name: &str, input: &'i [u8]) -> Result<Option<&'i [u8]>, MatchError> {
        match self.lookup(name) {
            Some(start) => self.matcher().run(start, input),
            None => Ok(None),
        }
    }
}
