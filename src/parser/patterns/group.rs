//! Parenthesized groups.

use crate::parser::engine::Parser;
use crate::parser::pattern::{Pattern, Window};
use crate::parser::result::{ParseError, ParseResult};
use crate::parser::token::{ParenthesisKind, TokenKind, TokenType};
use crate::syntax::{ContextId, NodeId};

/// `( a, b, ... )` → group with one child per comma-separated expression.
///
/// Groups are reduced before anything else so that headers and operands
/// around them only ever see a dynamic token.
pub struct ParenthesisPattern;

impl Pattern for ParenthesisPattern {
    fn name(&self) -> &'static str {
        "parenthesis"
    }

    fn slots(&self) -> &[TokenType] {
        &[TokenType::CONTENT]
    }

    fn priority(&self, _window: &Window) -> u32 {
        21
    }

    fn passes(&self, window: &Window) -> bool {
        window
            .get(0)
            .is_some_and(|token| token.is_content_of(ParenthesisKind::Parenthesis))
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let token = window.require(0, "a parenthesis")?;
        match token.kind {
            TokenKind::Content(content) => parser.group(context, &content),
            _ => Err(ParseError::Expected {
                expected: "a parenthesis",
                position: token.span.start,
            }),
        }
    }
}
