//! Syntax tree to bytecode compiler.
//!
//! Every definition compiles into a contiguous run of `Code`s in one shared
//! buffer, ending in a single `Terminal`. References are emitted unresolved
//! and patched by `finish` once the whole batch is registered, so patterns
//! may refer to names defined later.
//!
//! Layouts, with `@n` an absolute jump target:
//!
//! ```text
//! a | b | c      branch 3; empty @A; empty @B; empty @C;
//!                A: a; empty @J; B: b; empty @J; C: c; J:
//! x{1,3}         x; [branch 2; empty @X; empty @E; X: x] x2; E:
//! x{1,}          x; L: branch 2; empty @X; empty @E; X: x; empty @L; E:
//! ```

use std::ops::Range;

use tracing::{debug, warn};

use super::code::{Code, CodeBuffer, CodeKind};
use super::error::{CompileError, PatternError};
use super::lexer::tokenize;
use super::parser::parse_definitions;
use super::program::{Program, Unresolved};
use super::registry::Registry;
use super::span::Span;
use super::tree::{ObjectKind, SyntaxTree};

/// Largest accepted repetition bound.
pub const MAX_REPEAT: u32 = 4096;

/// Most codes one definition may expand to. Nested repetitions multiply,
/// so this bounds the product rather than each bound.
pub const MAX_PATTERN_CODES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    pub name: String,
    /// Index of the body's first instruction.
    pub start_index: usize,
    /// One past the pattern's `Terminal`.
    pub end_index: usize,
}

#[derive(Debug, Clone)]
struct Fixup {
    code_index: usize,
    name: String,
    span: Span,
    origin: usize,
}

#[derive(Debug, Default)]
pub struct Compiler {
    codes: CodeBuffer,
    registry: Registry,
    fixups: Vec<Fixup>,
    origin: usize,
    /// First code of the definition being compiled.
    body_start: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag subsequently compiled references with `origin`, typically the
    /// index of the file they came from.
    pub fn set_origin(&mut self, origin: usize) {
        self.origin = origin;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn codes(&self) -> &[Code] {
        self.codes.as_slice()
    }

    /// Tokenize, parse and compile every definition in `source`.
    ///
    /// Stops at the first error; definitions compiled before it stay
    /// registered.
    #[tracing::instrument(level = "debug", skip_all, fields(origin = self.origin, len = source.len()))]
    pub fn compile_source(&mut self, source: &str) -> Result<Vec<CompiledPattern>, PatternError> {
        let tokens = tokenize(source)?;
        let trees = parse_definitions(source, &tokens)?;
        debug!(tokens = tokens.len(), definitions = trees.len(), "parsed");

        let mut compiled = Vec::with_capacity(trees.len());
        for tree in &trees {
            compiled.push(self.compile(source, tree)?);
        }
        Ok(compiled)
    }

    /// Compile one definition tree and register its name.
    ///
    /// On error the code buffer is left exactly as it was and nothing is
    /// registered.
    pub fn compile(
        &mut self,
        source: &str,
        tree: &SyntaxTree,
    ) -> Result<CompiledPattern, CompileError> {
        let Some(name) = tree.name(source) else {
            return Err(CompileError::NotADefinition {
                span: tree.nodes().first().map_or_else(Span::default, |n| n.span),
            });
        };
        let declaration = tree.node(1).span;
        if self.registry.lookup(name).is_some() {
            return Err(CompileError::DuplicatePattern {
                name: name.to_string(),
                span: declaration,
            });
        }

        let start_index = self.codes.len();
        let fixup_mark = self.fixups.len();
        self.body_start = start_index;
        if let Err(err) = self.emit_body(source, tree) {
            self.codes.truncate(start_index);
            self.fixups.truncate(fixup_mark);
            return Err(err);
        }

        // Checked above, so registration cannot collide.
        self.registry
            .register(name, start_index)
            .map_err(|_| CompileError::DuplicatePattern {
                name: name.to_string(),
                span: declaration,
            })?;

        let end_index = self.codes.len();
        debug!(name, start_index, codes = end_index - start_index, "compiled pattern");
        Ok(CompiledPattern {
            name: name.to_string(),
            start_index,
            end_index,
        })
    }

    fn emit_body(&mut self, source: &str, tree: &SyntaxTree) -> Result<(), CompileError> {
        for child in tree.children(0).skip(1) {
            self.emit_node(source, tree, child)?;
        }
        self.codes.push(Code::new(CodeKind::Terminal));
        Ok(())
    }

    fn emit_node(
        &mut self,
        source: &str,
        tree: &SyntaxTree,
        index: usize,
    ) -> Result<(), CompileError> {
        let node = tree.node(index);
        match &node.kind {
            ObjectKind::LiteralCharacter(byte) => {
                self.codes.push(Code::new(CodeKind::Literal(*byte)));
            }
            ObjectKind::LiteralString(bytes) => {
                for &byte in bytes {
                    self.codes.push(Code::new(CodeKind::Literal(byte)));
                }
            }
            &ObjectKind::LiteralRange { low, high } => {
                if low > high {
                    return Err(CompileError::InvertedRange {
                        low,
                        high,
                        span: node.span,
                    });
                }
                self.codes.push(Code::new(CodeKind::Range(low, high)));
            }
            ObjectKind::LiteralWildcard => {
                self.codes.push(Code::new(CodeKind::Range(0x00, 0xFF)));
            }
            ObjectKind::LiteralReference => {
                let code_index = self.codes.push(Code::new(CodeKind::Reference(None)));
                self.fixups.push(Fixup {
                    code_index,
                    name: node.span.text(source).to_string(),
                    span: node.span,
                    origin: self.origin,
                });
            }
            ObjectKind::Definition | ObjectKind::Group => {
                for child in tree.children(index) {
                    self.emit_node(source, tree, child)?;
                }
            }
            ObjectKind::Declaration => {}
            ObjectKind::Or => self.emit_or(source, tree, index)?,
            &ObjectKind::RepeatFixed(count) => {
                check_limit(count, node.span)?;
                let operand = operand_of(tree, index);
                let mut template = None;
                for _ in 0..count {
                    self.emit_copy(source, tree, operand, node.span, &mut template)?;
                }
            }
            &ObjectKind::RepeatRange { min, max } => {
                if min > max {
                    return Err(CompileError::MalformedRepetition {
                        min,
                        max,
                        span: node.span,
                    });
                }
                check_limit(max, node.span)?;
                let operand = operand_of(tree, index);
                let mut template = None;
                for _ in 0..min {
                    self.emit_copy(source, tree, operand, node.span, &mut template)?;
                }
                let mut skips = Vec::with_capacity((max - min) as usize);
                for _ in min..max {
                    skips.push(self.emit_guard());
                    self.emit_copy(source, tree, operand, node.span, &mut template)?;
                }
                let end = self.codes.len();
                for skip in skips {
                    self.patch_jump(skip, end);
                }
            }
            &ObjectKind::RepeatInfinite { min } => {
                check_limit(min, node.span)?;
                let operand = operand_of(tree, index);
                let mut template = None;
                for _ in 0..min {
                    self.emit_copy(source, tree, operand, node.span, &mut template)?;
                }
                let head = self.codes.len();
                let exit = self.emit_guard();
                self.emit_copy(source, tree, operand, node.span, &mut template)?;
                let back = self.codes.push(Code::jump(0));
                self.patch_jump(back, head);
                let end = self.codes.len();
                self.patch_jump(exit, end);
            }
        }
        Ok(())
    }

    /// `branch k`, one entry jump per branch, then the branches. Every
    /// branch but the last jumps to the join point when it finishes.
    fn emit_or(&mut self, source: &str, tree: &SyntaxTree, index: usize) -> Result<(), CompileError> {
        let count = tree.node(index).child_count as usize;
        let branch = self.codes.push(Code::new(CodeKind::Branch(count)));
        let entries = branch + 1..branch + 1 + count;
        for _ in entries.clone() {
            self.codes.push(Code::jump(0));
        }

        let mut exits = Vec::with_capacity(count.saturating_sub(1));
        for (entry, child) in entries.zip(tree.children(index)) {
            let body = self.codes.len();
            self.patch_jump(entry, body);
            self.emit_node(source, tree, child)?;
            if exits.len() + 1 < count {
                exits.push(self.codes.push(Code::jump(0)));
            }
        }

        let join = self.codes.len();
        for exit in exits {
            self.patch_jump(exit, join);
        }
        Ok(())
    }

    /// `branch 2; empty +2; empty @?` in front of an optional body. Returns
    /// the index of the skip jump, to be patched once the end is known.
    fn emit_guard(&mut self) -> usize {
        self.codes.push(Code::new(CodeKind::Branch(2)));
        self.codes.push(Code::jump(2));
        self.codes.push(Code::jump(0))
    }

    /// Emit one copy of `operand`. The first copy is compiled from the tree;
    /// later ones duplicate its code, along with its pending references.
    fn emit_copy(
        &mut self,
        source: &str,
        tree: &SyntaxTree,
        operand: usize,
        span: Span,
        template: &mut Option<Range<usize>>,
    ) -> Result<(), CompileError> {
        match template.clone() {
            Some(range) => {
                self.check_budget(range.len(), span)?;
                let offset = self.codes.len() - range.start;
                self.codes.duplicate(range.start, range.end);
                let copies: Vec<Fixup> = self
                    .fixups
                    .iter()
                    .filter(|fixup| range.contains(&fixup.code_index))
                    .map(|fixup| Fixup {
                        code_index: fixup.code_index + offset,
                        ..fixup.clone()
                    })
                    .collect();
                self.fixups.extend(copies);
            }
            None => {
                let start = self.codes.len();
                self.emit_node(source, tree, operand)?;
                *template = Some(start..self.codes.len());
            }
        }
        Ok(())
    }

    fn check_budget(&self, extra: usize, span: Span) -> Result<(), CompileError> {
        if self.codes.len() - self.body_start + extra > MAX_PATTERN_CODES {
            return Err(CompileError::PatternTooLarge {
                limit: MAX_PATTERN_CODES,
                span,
            });
        }
        Ok(())
    }

    fn patch_jump(&mut self, at: usize, target: usize) {
        self.codes.get_mut(at).movement = target as isize - at as isize;
    }

    /// Resolve every pending reference and freeze the batch into a
    /// `Program`.
    ///
    /// Names that were never defined become dead `Reference(None)` codes,
    /// or fail the batch when `strict` is set.
    #[tracing::instrument(level = "debug", skip_all, fields(fixups = self.fixups.len(), strict = strict))]
    pub fn finish(mut self, strict: bool) -> Result<Program, CompileError> {
        let mut unresolved = Vec::new();

        for fixup in std::mem::take(&mut self.fixups) {
            match self.registry.lookup(&fixup.name) {
                Some(target) => {
                    self.codes.get_mut(fixup.code_index).kind = CodeKind::Reference(Some(target));
                }
                None if strict => {
                    return Err(CompileError::UnknownPattern {
                        name: fixup.name,
                        span: fixup.span,
                        origin: fixup.origin,
                    });
                }
                None => {
                    warn!(name = %fixup.name, origin = fixup.origin, span = %fixup.span, "reference to undefined pattern");
                    unresolved.push(Unresolved {
                        name: fixup.name,
                        span: fixup.span,
                        origin: fixup.origin,
                    });
                }
            }
        }

        debug!(
            patterns = self.registry.len(),
            codes = self.codes.len(),
            unresolved = unresolved.len(),
            "resolved references"
        );
        Ok(Program::new(self.codes.into_vec(), self.registry, unresolved))
    }
}

fn operand_of(tree: &SyntaxTree, repeat: usize) -> usize {
    debug_assert_eq!(tree.node(repeat).child_count, 1);
    repeat + 1
}

fn check_limit(count: u32, span: Span) -> Result<(), CompileError> {
    if count > MAX_REPEAT {
        return Err(CompileError::RepetitionLimit {
            count,
            limit: MAX_REPEAT,
            span,
        });
    }
    Ok(())
}
