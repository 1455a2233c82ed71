//! Worklist NFA simulation over compiled codes.
//!
//! States advance one instruction per generation and the worklist is kept in
//! priority order: a `Branch` enqueues its alternatives in source order, each
//! ahead of everything enqueued by later states. When a state reaches
//! `Terminal` its match is recorded and every lower priority state is
//! discarded; higher priority states already queued keep running and
//! replace the match if they reach `Terminal` too. The result is ordered
//! choice: `'a' | 'ab'` matches `a` of `ab`, `'ab' | 'a'` matches all of
//! `ab`, and `'a'*` is greedy.
//! Matching is anchored at the start of the input.

use std::collections::HashSet;

use tracing::trace;

use super::code::{Code, CodeKind};
use super::error::MatchError;

/// Default bound on nested `Reference` runs.
pub const DEFAULT_RECURSION_LIMIT: usize = 128;

/// Largest accepted recursion limit. Each nested `Reference` is a native
/// call frame, and this keeps the deepest run well inside a 2 MiB thread
/// stack (rayon's default).
pub const MAX_RECURSION_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy)]
pub struct SimState<'i> {
    pub remaining: &'i [u8],
    pub code_index: usize,
    pub dead: bool,
    /// Steps taken since this state last consumed input.
    pub stalled: usize,
}

impl<'i> SimState<'i> {
    fn at(remaining: &'i [u8], code_index: usize, stalled: usize) -> Self {
        Self {
            remaining,
            code_index,
            dead: false,
            stalled,
        }
    }

    fn advance(&mut self, consumed: usize, movement: isize) {
        self.remaining = &self.remaining[consumed..];
        self.code_index = self.code_index.wrapping_add_signed(movement);
        self.stalled = if consumed > 0 { 0 } else { self.stalled + 1 };
    }
}

/// Read-only view of a program's codes. Each `run` owns its worklists, so
/// one `Matcher` can serve any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'p> {
    codes: &'p [Code],
    recursion_limit: usize,
}

impl<'p> Matcher<'p> {
    pub fn new(codes: &'p [Code]) -> Self {
        Self {
            codes,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Set the nesting limit, clamped to `MAX_RECURSION_LIMIT`.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit.min(MAX_RECURSION_LIMIT);
        self
    }

    /// Match the pattern starting at `start_index` against a prefix of
    /// `input`, returning the matched prefix.
    pub fn run<'i>(&self, start_index: usize, input: &'i [u8]) -> Result<Option<&'i [u8]>, MatchError> {
        self.run_nested(start_index, input, 0)
    }

    fn run_nested<'i>(
        &self,
        start_index: usize,
        input: &'i [u8],
        depth: usize,
    ) -> Result<Option<&'i [u8]>, MatchError> {
        if depth > self.recursion_limit {
            return Err(MatchError::RecursionLimit {
                limit: self.recursion_limit,
            });
        }

        let mut active = vec![SimState::at(input, start_index, 0)];
        let mut next: Vec<SimState<'i>> = Vec::new();
        // (code index, bytes consumed) pairs queued for the next generation.
        let mut queued: HashSet<(usize, usize)> = HashSet::new();
        let mut generation = 0usize;
        let mut matched = None;

        while !active.is_empty() {
            trace!(depth, generation, states = active.len(), "step");
            next.clear();
            queued.clear();

            for mut state in active.drain(..) {
                let Some(code) = self.codes.get(state.code_index) else {
                    continue;
                };

                match code.kind {
                    CodeKind::Terminal => {
                        let consumed = input.len() - state.remaining.len();
                        matched = Some(&input[..consumed]);
                        // Everything after this state in `active` ranks lower.
                        break;
                    }
                    CodeKind::Branch(count) => {
                        for offset in 1..=count {
                            let fork = SimState::at(
                                state.remaining,
                                state.code_index + offset,
                                state.stalled + 1,
                            );
                            self.schedule(&mut next, &mut queued, input, fork);
                        }
                        continue;
                    }
                    CodeKind::Empty => state.advance(0, code.movement),
                    CodeKind::Literal(_) | CodeKind::Range(..) => {
                        match state.remaining.first() {
                            Some(&byte) if code.accepts(byte) => state.advance(1, code.movement),
                            _ => state.dead = true,
                        }
                    }
                    CodeKind::Reference(Some(target)) => {
                        match self.run_nested(target, state.remaining, depth + 1)? {
                            Some(sub) => state.advance(sub.len(), code.movement),
                            None => state.dead = true,
                        }
                    }
                    CodeKind::Reference(None) => state.dead = true,
                }

                if !state.dead {
                    self.schedule(&mut next, &mut queued, input, state);
                }
            }

            std::mem::swap(&mut active, &mut next);
            generation += 1;
        }

        Ok(matched)
    }

    /// Queue `state` for the next generation.
    ///
    /// A state equal in code index and input consumed to one already queued
    /// this generation behaves identically but ranks lower, so it is
    /// dropped. A state that has gone more steps than there are codes
    /// without consuming input is repeating an instruction at the same
    /// position; it is dropped too, which ends loops that make no progress.
    fn schedule<'i>(
        &self,
        next: &mut Vec<SimState<'i>>,
        queued: &mut HashSet<(usize, usize)>,
        input: &'i [u8],
        state: SimState<'i>,
    ) {
        if state.stalled > self.codes.len() {
            return;
        }
        let consumed = input.len() - state.remaining.len();
        if queued.insert((state.code_index, consumed)) {
            next.push(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(byte: u8) -> Code {
        Code::new(CodeKind::Literal(byte))
    }

    fn terminal() -> Code {
        Code::new(CodeKind::Terminal)
    }

    #[test]
    fn test_run_literal_sequence() {
        let codes = [lit(b'a'), lit(b'b'), terminal()];
        let m = Matcher::new(&codes);
        assert_eq!(m.run(0, b"abc").unwrap(), Some(&b"ab"[..]));
        assert_eq!(m.run(0, b"a").unwrap(), None);
        assert_eq!(m.run(0, b"xab").unwrap(), None);
    }

    #[test]
    fn test_run_branch_priority() {
        // 'a' | 'ab'
        let codes = [
            Code::new(CodeKind::Branch(2)),
            Code::jump(2),
            Code::jump(3),
            lit(b'a'),
            Code::jump(3),
            lit(b'a'),
            lit(b'b'),
            terminal(),
        ];
        let m = Matcher::new(&codes);
        assert_eq!(m.run(0, b"ab").unwrap(), Some(&b"a"[..]));
    }

    #[test]
    fn test_run_higher_priority_outlives_earlier_terminal() {
        // 'ab' | 'a'
        let codes = [
            Code::new(CodeKind::Branch(2)),
            Code::jump(2),
            Code::jump(4),
            lit(b'a'),
            lit(b'b'),
            Code::jump(2),
            lit(b'a'),
            terminal(),
        ];
        let m = Matcher::new(&codes);
        assert_eq!(m.run(0, b"abc").unwrap(), Some(&b"ab"[..]));
        assert_eq!(m.run(0, b"ac").unwrap(), Some(&b"a"[..]));
    }

    #[test]
    fn test_run_empty_pattern_matches_nothing() {
        let codes = [terminal()];
        assert_eq!(Matcher::new(&codes).run(0, b"xyz").unwrap(), Some(&b""[..]));
    }

    #[test]
    fn test_run_dead_reference() {
        let codes = [Code::new(CodeKind::Reference(None)), terminal()];
        assert_eq!(Matcher::new(&codes).run(0, b"x").unwrap(), None);
    }

    #[test]
    fn test_run_reference_consumes_submatch() {
        let codes = [
            Code::new(CodeKind::Reference(Some(3))),
            lit(b'!'),
            terminal(),
            Code::new(CodeKind::Range(b'0', b'9')),
            terminal(),
        ];
        let m = Matcher::new(&codes);
        assert_eq!(m.run(0, b"7!").unwrap(), Some(&b"7!"[..]));
        assert_eq!(m.run(0, b"x!").unwrap(), None);
    }

    #[test]
    fn test_run_self_reference_hits_limit() {
        let codes = [Code::new(CodeKind::Reference(Some(0))), terminal()];
        let m = Matcher::new(&codes).with_recursion_limit(16);
        assert_eq!(
            m.run(0, b"anything"),
            Err(MatchError::RecursionLimit { limit: 16 })
        );
    }

    #[test]
    fn test_run_zero_progress_loop_terminates() {
        // [empty]* 'x'
        let codes = [
            Code::new(CodeKind::Branch(2)),
            Code::jump(2),
            Code::jump(3),
            Code::jump(1),
            Code::jump(-4),
            lit(b'x'),
            terminal(),
        ];
        let m = Matcher::new(&codes);
        assert_eq!(m.run(0, b"y").unwrap(), None);
        assert_eq!(m.run(0, b"x").unwrap(), Some(&b"x"[..]));
    }

    #[test]
    fn test_run_out_of_range_index_is_dead() {
        let codes = [Code::jump(5)];
        assert_eq!(Matcher::new(&codes).run(0, b"").unwrap(), None);
    }
}
