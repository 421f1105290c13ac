//! Control flow: loops, conditionals and returns.

use super::{block, is_block};
use crate::parser::engine::Parser;
use crate::parser::keywords::Keyword;
use crate::parser::pattern::{Pattern, Window};
use crate::parser::result::{ParseError, ParseResult};
use crate::parser::token::{Token, TokenType};
use crate::syntax::{ContextId, NodeId, NodeKind};

fn group(token: &Token) -> ParseResult<NodeId> {
    match token.dynamic() {
        Some(node) if token.is_group() => Ok(node),
        _ => Err(ParseError::Expected {
            expected: "a parenthesized header",
            position: token.span.start,
        }),
    }
}

// ============================================================================
// WHILE
// ============================================================================

/// `while (steps) { body }`
///
/// The header is molded into `{initializer, condition, increment}`:
/// one step is the condition, two are condition and increment, three are
/// taken as they are. Missing steps become empty nodes. The body is parsed
/// once the statements around the loop are built.
pub struct WhilePattern;

impl Pattern for WhilePattern {
    fn name(&self) -> &'static str {
        "while"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::KEYWORD,
            TokenType::DYNAMIC,
            TokenType::END.union(TokenType::OPTIONAL),
            TokenType::CONTENT,
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        15
    }

    fn passes(&self, window: &Window) -> bool {
        window.keyword(0) == Some(Keyword::While)
            && window.get(1).is_some_and(Token::is_group)
            && is_block(window.get(3))
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let header = group(&window.require(1, "a loop header")?)?;
        let body = block(window.require(3, "a loop body")?)?;

        mold(parser, header)?;

        let scope = parser.tree_mut().child_context(context)?;
        let body = parser.defer_block(scope, body);

        let tree = parser.tree_mut();
        let node = tree.alloc(NodeKind::While, span);
        tree.set_context(node, scope);
        tree.add(node, header);
        tree.add(node, body);
        Ok(node)
    }
}

/// Normalize a loop header to exactly three steps.
fn mold(parser: &mut Parser<'_>, header: NodeId) -> ParseResult<()> {
    let tree = parser.tree_mut();
    let position = tree.span(header).start;
    let steps: Vec<_> = tree.children(header).collect();

    match steps.as_slice() {
        [] => return Err(ParseError::EmptyWhileHeader { position }),
        [condition] => {
            let initializer = tree.alloc(NodeKind::Empty, tree.span(*condition));
            tree.insert(*condition, initializer);
            let increment = tree.alloc(NodeKind::Empty, tree.span(*condition));
            tree.add(header, increment);
        }
        [condition, _increment] => {
            let initializer = tree.alloc(NodeKind::Empty, tree.span(*condition));
            tree.insert(*condition, initializer);
        }
        _ => {}
    }

    Ok(())
}

// ============================================================================
// IF
// ============================================================================

/// `if (condition) { body } [else { body }]`
///
/// Each body gets its own scope and is parsed once the statements around
/// the conditional are built. The else keyword and its block come as a
/// pair.
pub struct IfPattern;

impl Pattern for IfPattern {
    fn name(&self) -> &'static str {
        "if"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::KEYWORD,
            TokenType::DYNAMIC,
            TokenType::END.union(TokenType::OPTIONAL),
            TokenType::CONTENT,
            TokenType::END.union(TokenType::OPTIONAL),
            TokenType::KEYWORD.union(TokenType::OPTIONAL),
            TokenType::END.union(TokenType::OPTIONAL),
            TokenType::CONTENT.union(TokenType::OPTIONAL),
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        15
    }

    fn passes(&self, window: &Window) -> bool {
        let otherwise = match (window.has(5), window.has(7)) {
            (true, true) => window.keyword(5) == Some(Keyword::Else) && is_block(window.get(7)),
            (false, false) => true,
            _ => false,
        };

        window.keyword(0) == Some(Keyword::If)
            && window.get(1).is_some_and(Token::is_group)
            && is_block(window.get(3))
            && otherwise
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let header = group(&window.require(1, "a condition")?)?;
        let then = block(window.require(3, "a block")?)?;
        let otherwise = window.take(7).map(block).transpose()?;

        let tree = parser.tree_mut();
        let count = tree.child_count(header);
        let condition = match tree.first(header) {
            Some(condition) if count == 1 => condition,
            _ => {
                return Err(ParseError::InvalidCondition {
                    count,
                    position: tree.span(header).start,
                });
            }
        };
        tree.detach(condition);

        let node = tree.alloc(NodeKind::If, span);
        tree.add(node, condition);

        let scope = parser.tree_mut().child_context(context)?;
        let then = parser.defer_block(scope, then);
        parser.tree_mut().set_context(then, scope);
        parser.tree_mut().add(node, then);

        if let Some(otherwise) = otherwise {
            let scope = parser.tree_mut().child_context(context)?;
            let otherwise = parser.defer_block(scope, otherwise);
            parser.tree_mut().set_context(otherwise, scope);
            parser.tree_mut().add(node, otherwise);
        }

        Ok(node)
    }
}

// ============================================================================
// RETURN
// ============================================================================

/// `return value`
///
/// Lowest priority except for lone operands: whatever the value is built
/// from is reduced first.
pub struct ReturnPattern;

impl Pattern for ReturnPattern {
    fn name(&self) -> &'static str {
        "return"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::KEYWORD,
            TokenType::FUNCTION
                .union(TokenType::IDENTIFIER)
                .union(TokenType::NUMBER)
                .union(TokenType::CONTENT)
                .union(TokenType::DYNAMIC),
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        1
    }

    fn passes(&self, window: &Window) -> bool {
        window.keyword(0) == Some(Keyword::Return)
            && window.get(1).is_some_and(|token| token.is_value() || token.content().is_some())
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let value = window.require(1, "a return value")?;
        let value = parser.operand(context, value)?;

        let tree = parser.tree_mut();
        let node = tree.alloc(NodeKind::Return, span);
        tree.add(node, value);
        Ok(node)
    }
}
