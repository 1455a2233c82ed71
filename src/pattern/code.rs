//! Compiled pattern instructions.
//!
//! Every pattern compiles into a run of `Code`s in one shared buffer. An
//! instruction's `movement` is the relative jump taken after it succeeds;
//! plain fall-through is `1`.

use std::fmt;

use super::error::show_byte;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// Consumes nothing, always succeeds.
    Empty,
    Literal(u8),
    /// Inclusive byte range.
    Range(u8, u8),
    /// Run another pattern starting at this absolute index. `None` marks a
    /// reference to a name that was never defined; it never matches.
    Reference(Option<usize>),
    /// Fork into the next `count` instructions, in priority order.
    Branch(usize),
    /// The pattern matched.
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub movement: isize,
    pub kind: CodeKind,
}

impl Code {
    pub fn new(kind: CodeKind) -> Self {
        Self { movement: 1, kind }
    }

    pub fn jump(movement: isize) -> Self {
        Self {
            movement,
            kind: CodeKind::Empty,
        }
    }

    /// Byte consumed by this instruction, if it consumes one.
    pub fn accepts(&self, byte: u8) -> bool {
        match self.kind {
            CodeKind::Literal(expected) => byte == expected,
            CodeKind::Range(low, high) => (low..=high).contains(&byte),
            _ => false,
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeKind::Empty => f.write_str("empty"),
            CodeKind::Literal(byte) => write!(f, "literal '{}'", show_byte(byte)),
            CodeKind::Range(low, high) => {
                write!(f, "range '{}'..'{}'", show_byte(low), show_byte(high))
            }
            CodeKind::Reference(Some(target)) => write!(f, "reference @{target}"),
            CodeKind::Reference(None) => f.write_str("reference <unresolved>"),
            CodeKind::Branch(count) => write!(f, "branch {count}"),
            CodeKind::Terminal => f.write_str("terminal"),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CodeKind::Terminal => write!(f, "{}", self.kind),
            _ => write!(f, "{:<24} {:+}", self.kind.to_string(), self.movement),
        }
    }
}

/// Capacity to grow to when `required` slots no longer fit in `current`.
///
/// Doubling keeps appends amortized O(1); the `required * 1.5` floor stops
/// a large batch from reallocating again right away.
pub fn grown_capacity(current: usize, required: usize) -> usize {
    (current * 2).max(required + required / 2).max(16)
}

/// Append-only instruction buffer shared by every compiled pattern.
#[derive(Debug, Default, Clone)]
pub struct CodeBuffer {
    codes: Vec<Code>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.codes.capacity()
    }

    fn reserve_for(&mut self, additional: usize) {
        let required = self.codes.len() + additional;
        if required > self.codes.capacity() {
            let target = grown_capacity(self.codes.capacity(), required);
            self.codes.reserve_exact(target - self.codes.len());
        }
    }

    /// Append one instruction, returning its index.
    pub fn push(&mut self, code: Code) -> usize {
        self.reserve_for(1);
        self.codes.push(code);
        self.codes.len() - 1
    }

    /// Append a copy of `start..end` of this buffer.
    pub fn duplicate(&mut self, start: usize, end: usize) {
        self.reserve_for(end - start);
        self.codes.extend_from_within(start..end);
    }

    /// Drop everything from `len` on.
    pub fn truncate(&mut self, len: usize) {
        self.codes.truncate(len);
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Code {
        &mut self.codes[index]
    }

    pub fn as_slice(&self) -> &[Code] {
        &self.codes
    }

    pub fn into_vec(self) -> Vec<Code> {
        self.codes
    }
}
