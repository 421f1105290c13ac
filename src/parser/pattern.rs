//! Grammar patterns and the windows they match.
//!
//! A [`Pattern`] is a fixed list of slot masks. Matching a pattern at a
//! position walks the slots left to right over the token sequence:
//!
//! - a plain slot consumes one token whose kind bit is in the mask
//! - an `OPTIONAL` slot may also consume nothing
//! - an `END` slot consumes nothing and requires the next token to start a
//!   line, or the sequence to be exhausted
//!
//! A slot after the first consumed token may only take a token that starts
//! a line when the slot right before it is an `END` slot, so statements do
//! not run into each other across lines.
//!
//! Structural matching never fails loudly: a window that does not fit, or
//! whose guard rejects it, is simply not a candidate. Only
//! [`Pattern::build`] can return an error.

use std::ops::Range;

use super::engine::Parser;
use super::keywords::{Keyword, Operator};
use super::result::{ParseError, ParseResult};
use super::token::{Token, TokenType};
use crate::base::{Position, Span};
use crate::syntax::{ContextId, NodeId};

// ============================================================================
// PATTERN
// ============================================================================

/// A prioritized grammar rule.
///
/// Patterns are stateless; everything a guard or builder needs is in the
/// [`Window`].
pub trait Pattern: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Slot masks, in order.
    fn slots(&self) -> &[TokenType];

    /// Index of the first slot that is replaced by the built node.
    ///
    /// Slots before it are matched and visible to the guard, but their tokens
    /// stay in the sequence.
    fn start(&self) -> usize {
        0
    }

    /// Rank of a matched window. Higher wins.
    fn priority(&self, window: &Window) -> u32;

    /// Guard evaluated once the window fits the slot masks.
    fn passes(&self, _window: &Window) -> bool {
        true
    }

    /// Turn the window into a node.
    fn build(&self, parser: &mut Parser<'_>, context: ContextId, window: Window) -> ParseResult<NodeId>;
}

// ============================================================================
// WINDOW
// ============================================================================

/// Tokens matched by a pattern, aligned with its slots.
///
/// Skipped optional slots and `END` slots hold `None`.
#[derive(Clone, Debug)]
pub struct Window {
    tokens: Vec<Option<Token>>,
    start: usize,
}

impl Window {
    pub fn new(tokens: Vec<Option<Token>>, start: usize) -> Self {
        Self { tokens, start }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(Option::is_none)
    }

    /// Token matched by `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<&Token> {
        self.tokens.get(slot).and_then(Option::as_ref)
    }

    pub fn has(&self, slot: usize) -> bool {
        self.get(slot).is_some()
    }

    /// Move the token out of `slot`.
    pub fn take(&mut self, slot: usize) -> Option<Token> {
        self.tokens.get_mut(slot).and_then(Option::take)
    }

    /// Move the token out of a slot the pattern cannot match without.
    pub fn require(&mut self, slot: usize, expected: &'static str) -> ParseResult<Token> {
        let position = self.position();
        self.take(slot)
            .ok_or(ParseError::Expected { expected, position })
    }

    pub fn keyword(&self, slot: usize) -> Option<Keyword> {
        self.get(slot).and_then(Token::keyword)
    }

    pub fn operator(&self, slot: usize) -> Option<Operator> {
        self.get(slot).and_then(Token::operator)
    }

    /// Whether the token in `slot` is usable as an operand.
    pub fn is_value(&self, slot: usize) -> bool {
        self.get(slot).is_some_and(Token::is_value)
    }

    fn replaced(&self) -> impl Iterator<Item = &Token> {
        self.tokens[self.start.min(self.tokens.len())..]
            .iter()
            .filter_map(Option::as_ref)
    }

    /// Where the replaced part of the window begins.
    pub fn position(&self) -> Position {
        self.replaced()
            .next()
            .map(|token| token.span.start)
            .unwrap_or_default()
    }

    /// Span covering the replaced tokens.
    pub fn span(&self) -> Span {
        self.replaced()
            .map(|token| token.span)
            .reduce(Span::cover)
            .unwrap_or_default()
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// A guarded match of one pattern at one position.
pub struct Match<'p> {
    pub pattern: &'p dyn Pattern,
    pub window: Window,
    /// Tokens of the sequence the built node replaces.
    pub range: Range<usize>,
    pub priority: u32,
}

/// Match `pattern` with its first slot at `position`.
///
/// Optional slots are tried consuming first. The first alternative that
/// fits and whose guard passes is returned.
pub fn match_at<'p>(pattern: &'p dyn Pattern, tokens: &[Token], position: usize) -> Option<Match<'p>> {
    let mut search = Search {
        pattern,
        slots: pattern.slots(),
        tokens,
        origin: position,
        assigned: Vec::with_capacity(pattern.slots().len()),
        found: None,
    };
    search.slot(0, position, None);
    search.found
}

struct Search<'p, 't> {
    pattern: &'p dyn Pattern,
    slots: &'p [TokenType],
    tokens: &'t [Token],
    origin: usize,
    assigned: Vec<Option<usize>>,
    found: Option<Match<'p>>,
}

impl<'p> Search<'p, '_> {
    /// Try every way of filling the remaining slots. Returns `true` once a
    /// match is found.
    fn slot(&mut self, slot: usize, cursor: usize, replaced_from: Option<usize>) -> bool {
        let replaced_from = if slot == self.pattern.start() {
            Some(cursor)
        } else {
            replaced_from
        };

        if slot == self.slots.len() {
            return self.complete(replaced_from.unwrap_or(cursor)..cursor);
        }

        let mask = self.slots[slot];

        if mask.is_end() {
            let at_end = cursor == self.tokens.len() || self.tokens[cursor].starts_line();
            if at_end || mask.is_optional() {
                self.assigned.push(None);
                if self.slot(slot + 1, cursor, replaced_from) {
                    return true;
                }
                self.assigned.pop();
            }
            return false;
        }

        if self.fits(slot, cursor) {
            self.assigned.push(Some(cursor));
            if self.slot(slot + 1, cursor + 1, replaced_from) {
                return true;
            }
            self.assigned.pop();
        }

        if mask.is_optional() {
            self.assigned.push(None);
            if self.slot(slot + 1, cursor, replaced_from) {
                return true;
            }
            self.assigned.pop();
        }

        false
    }

    fn fits(&self, slot: usize, cursor: usize) -> bool {
        let Some(token) = self.tokens.get(cursor) else {
            return false;
        };

        if !self.slots[slot].intersects(token.token_type()) {
            return false;
        }

        // A token on a new line only continues the window after an END slot
        cursor == self.origin
            || !token.starts_line()
            || (slot > 0 && self.slots[slot - 1].is_end())
    }

    fn complete(&mut self, range: Range<usize>) -> bool {
        if range.is_empty() {
            return false;
        }

        let tokens = self
            .assigned
            .iter()
            .map(|index| index.map(|i| self.tokens[i].clone()))
            .collect();
        let window = Window::new(tokens, self.pattern.start());

        if !self.pattern.passes(&window) {
            return false;
        }

        self.found = Some(Match {
            pattern: self.pattern,
            priority: self.pattern.priority(&window),
            window,
            range,
        });
        true
    }
}
