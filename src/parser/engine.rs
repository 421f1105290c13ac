//! Priority-driven reduction of token sequences into syntax trees.
//!
//! The engine repeatedly scans the token sequence for the best guarded
//! match of any registered pattern, builds it, and replaces the matched
//! tokens with one dynamic token wrapping the new node. When nothing matches
//! any more, every token must be dynamic; the wrapped nodes are the result.
//!
//! Among all matches the winner is chosen by:
//! 1. highest priority
//! 2. leftmost replaced range
//! 3. shortest replaced range
//! 4. earliest registered pattern
//!
//! A statement can therefore be built before the statements above it. A
//! name that is not visible yet becomes an unresolved placeholder, bound
//! once the whole sequence is reduced (or, across files, by the resolver).
//! Block bodies of loops and conditionals are parsed after the statements
//! around them, so they see every name their enclosing block declares.

use std::cmp::Reverse;

use smol_str::SmolStr;
use tracing::debug;

use super::keywords::Operator;
use super::pattern::{Match, Pattern, match_at};
use super::result::{ParseError, ParseResult};
use super::token::{ContentToken, FunctionToken, ParenthesisKind, Token, TokenFlags, TokenKind};
use crate::base::{Position, Span};
use crate::syntax::{ContextId, NameRole, NodeId, NodeKind, SyntaxTree, VariableCategory};

// ============================================================================
// PATTERN SET
// ============================================================================

/// An ordered registry of patterns.
#[derive(Default)]
pub struct PatternSet {
    patterns: Vec<Box<dyn Pattern>>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pattern: impl Pattern + 'static) {
        self.patterns.push(Box::new(pattern));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, pattern: impl Pattern + 'static) -> Self {
        self.register(pattern);
        self
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.patterns.iter().map(|pattern| pattern.name())
    }

    /// The winning match over the whole sequence, if any pattern matches.
    pub fn best_match(&self, tokens: &[Token]) -> Option<Match<'_>> {
        let mut best: Option<(Key, Match<'_>)> = None;

        for position in 0..tokens.len() {
            for (order, pattern) in self.patterns.iter().enumerate() {
                let Some(found) = match_at(pattern.as_ref(), tokens, position) else {
                    continue;
                };

                let key = Key {
                    priority: Reverse(found.priority),
                    start: found.range.start,
                    len: found.range.len(),
                    order,
                };

                if best.as_ref().is_none_or(|(current, _)| key < *current) {
                    best = Some((key, found));
                }
            }
        }

        best.map(|(_, found)| found)
    }
}

impl std::fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Ordering of candidate matches; the smallest key wins.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Key {
    priority: Reverse<u32>,
    start: usize,
    len: usize,
    order: usize,
}

// ============================================================================
// PARSER
// ============================================================================

/// Reduces token sequences into nodes of a [`SyntaxTree`].
///
/// `category` is what a variable introduced by this parser is declared as:
/// globals while parsing a file, members in a type body, locals in a
/// function body.
pub struct Parser<'a> {
    patterns: &'a PatternSet,
    tree: &'a mut SyntaxTree,
    category: VariableCategory,
    /// Block bodies waiting for the statements around them
    deferred: Vec<Deferred>,
}

struct Deferred {
    block: NodeId,
    context: ContextId,
    content: ContentToken,
}

impl<'a> Parser<'a> {
    pub fn new(patterns: &'a PatternSet, tree: &'a mut SyntaxTree, category: VariableCategory) -> Self {
        Self {
            patterns,
            tree,
            category,
            deferred: Vec::new(),
        }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &*self.tree
    }

    pub fn tree_mut(&mut self) -> &mut SyntaxTree {
        &mut *self.tree
    }

    pub fn category(&self) -> VariableCategory {
        self.category
    }

    /// Reduce `tokens` under `context` into a new block node.
    pub fn parse(&mut self, context: ContextId, tokens: Vec<Token>) -> ParseResult<NodeId> {
        let span = span_of(&tokens);
        let block = self.tree.alloc(NodeKind::Block, span);
        self.parse_into(block, context, tokens)?;
        Ok(block)
    }

    /// Reduce `tokens` and append the resulting nodes to `parent`.
    ///
    /// Deferred block bodies are parsed afterwards, then every placeholder
    /// whose name is now visible is bound.
    pub fn parse_into(&mut self, parent: NodeId, context: ContextId, tokens: Vec<Token>) -> ParseResult<()> {
        for node in self.reduce(context, tokens)? {
            self.tree.add(parent, node);
        }

        while !self.deferred.is_empty() {
            for Deferred { block, context, content } in std::mem::take(&mut self.deferred) {
                for node in self.reduce(context, content.tokens()?)? {
                    self.tree.add(block, node);
                }
            }
        }

        self.tree.settle(parent);
        Ok(())
    }

    /// An empty block for `content`, filled once the current sequence is
    /// reduced.
    pub fn defer_block(&mut self, context: ContextId, content: ContentToken) -> NodeId {
        let block = self.tree.alloc(NodeKind::Block, content.span);
        self.deferred.push(Deferred { block, context, content });
        block
    }

    /// Tokenize bracketed content and parse it as a block.
    pub fn parse_content(&mut self, context: ContextId, content: &ContentToken) -> ParseResult<NodeId> {
        let tokens = content.tokens()?;
        let block = self.tree.alloc(NodeKind::Block, content.span);
        self.parse_into(block, context, tokens)?;
        Ok(block)
    }

    /// Reduce `tokens` to exactly one value.
    pub fn parse_expression(
        &mut self,
        context: ContextId,
        tokens: Vec<Token>,
        position: Position,
    ) -> ParseResult<NodeId> {
        let nodes = self.reduce(context, tokens)?;

        match nodes.as_slice() {
            [] => Err(ParseError::Expected { expected: "an expression", position }),
            [node] if self.tree.kind(*node).is_value() => Ok(*node),
            [node] => Err(ParseError::Expected {
                expected: "an expression",
                position: self.tree.span(*node).start,
            }),
            [_, extra, ..] => Err(ParseError::Expected {
                expected: "',' between expressions",
                position: self.tree.span(*extra).start,
            }),
        }
    }

    /// Parse the comma-separated expressions of `content` as children of `parent`.
    ///
    /// Line breaks inside the brackets do not end an expression.
    pub fn parse_steps(&mut self, parent: NodeId, context: ContextId, content: &ContentToken) -> ParseResult<()> {
        let tokens = content.tokens()?;
        if tokens.is_empty() {
            return Ok(());
        }

        let mut step = Vec::new();
        let mut position = content.inner_start();

        for mut token in tokens {
            if token.operator() == Some(Operator::Comma) {
                let node = self.parse_expression(context, std::mem::take(&mut step), position)?;
                self.tree.add(parent, node);
                position = token.span.end;
                continue;
            }

            token.flags = if step.is_empty() {
                token.flags.with(TokenFlags::LINE_START)
            } else {
                token.flags.without(TokenFlags::LINE_START)
            };
            step.push(token);
        }

        let node = self.parse_expression(context, step, position)?;
        self.tree.add(parent, node);
        Ok(())
    }

    /// Turn a single operand token into a node.
    pub fn operand(&mut self, context: ContextId, token: Token) -> ParseResult<NodeId> {
        let span = token.span;

        match token.kind {
            TokenKind::Dynamic(node) => Ok(node),
            TokenKind::Number { value, .. } => Ok(self.tree.alloc(NodeKind::Number(value), span)),
            TokenKind::Identifier(name) => Ok(self.variable(context, name, span)),
            TokenKind::Function(function) => self.call(context, &function, span),
            TokenKind::Content(content) if content.kind == ParenthesisKind::Parenthesis => {
                self.group(context, &content)
            }
            TokenKind::Content(_) | TokenKind::Operator(_) | TokenKind::Keyword(_) => {
                Err(ParseError::Expected { expected: "an expression", position: span.start })
            }
        }
    }

    /// Reference to a variable seen from `context`.
    pub fn variable(&mut self, context: ContextId, name: SmolStr, span: Span) -> NodeId {
        let node = self.tree.alloc(
            NodeKind::Unresolved { name, context, role: NameRole::Value },
            span,
        );
        self.tree.bind(node);
        node
    }

    /// Call of a function, or construction of a type, seen from `context`.
    pub fn call(&mut self, context: ContextId, function: &FunctionToken, span: Span) -> ParseResult<NodeId> {
        let kind = NodeKind::Unresolved {
            name: function.name.clone(),
            context,
            role: NameRole::Call,
        };
        let node = self.call_with(context, kind, function, span)?;
        self.tree.bind(node);
        Ok(node)
    }

    /// Build a call-like node of `kind` whose children are the arguments.
    pub fn call_with(
        &mut self,
        context: ContextId,
        kind: NodeKind,
        function: &FunctionToken,
        span: Span,
    ) -> ParseResult<NodeId> {
        let node = self.tree.alloc(kind, span);
        self.parse_steps(node, context, &function.parameters)?;
        Ok(node)
    }

    /// Parenthesized group with one child per comma-separated expression.
    pub fn group(&mut self, context: ContextId, content: &ContentToken) -> ParseResult<NodeId> {
        let node = self.tree.alloc(NodeKind::Group, content.span);
        self.parse_steps(node, context, content)?;
        Ok(node)
    }

    /// Run the reduction loop to a fixed point.
    fn reduce(&mut self, context: ContextId, mut tokens: Vec<Token>) -> ParseResult<Vec<NodeId>> {
        let patterns = self.patterns;

        while let Some(found) = patterns.best_match(&tokens) {
            let Match { pattern, window, range, priority } = found;
            debug!(
                pattern = pattern.name(),
                priority,
                start = range.start,
                end = range.end,
                "reduce"
            );

            let line_start = tokens[range.start].starts_line();
            let span = window.span();
            let node = pattern.build(self, context, window)?;

            let kind = self.tree.kind(node);
            let mut flags = TokenFlags::NONE;
            if line_start {
                flags = flags.with(TokenFlags::LINE_START);
            }
            if kind.is_value() {
                flags = flags.with(TokenFlags::VALUE);
            }
            if matches!(kind, NodeKind::Group) {
                flags = flags.with(TokenFlags::GROUP);
            }

            tokens.splice(range, [Token::new(TokenKind::Dynamic(node), span, flags)]);
        }

        tokens
            .into_iter()
            .map(|token| match token.kind {
                TokenKind::Dynamic(node) => Ok(node),
                _ => Err(ParseError::NoMatch {
                    text: SmolStr::new(token.text()),
                    position: token.span.start,
                }),
            })
            .collect()
    }
}

fn span_of(tokens: &[Token]) -> Span {
    tokens
        .iter()
        .map(|token| token.span)
        .reduce(Span::cover)
        .unwrap_or_default()
}
