//! The standard Weave grammar.
//!
//! | Pattern     | Priority                 |
//! |-------------|--------------------------|
//! | parenthesis | 21                       |
//! | type        | 20                       |
//! | function    | 20                       |
//! | link        | 19                       |
//! | unary sign  | 18                       |
//! | declaration | 17                       |
//! | while, if   | 15                       |
//! | binary      | operator precedence 3-12 |
//! | return      | 1                        |
//! | singleton   | 0                        |

mod control;
mod declare;
mod expression;
mod group;

use once_cell::sync::Lazy;
use smol_str::SmolStr;

pub use control::{IfPattern, ReturnPattern, WhilePattern};
pub use declare::{DeclarationPattern, FunctionPattern, TypePattern};
pub use expression::{BinaryPattern, LinkPattern, SingletonPattern, UnarySignPattern};
pub use group::ParenthesisPattern;

use super::engine::PatternSet;
use super::result::{ParseError, ParseResult};
use super::token::{ContentToken, FunctionToken, ParenthesisKind, Token, TokenKind};
use crate::base::Span;

static STANDARD: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new()
        .with(ParenthesisPattern)
        .with(TypePattern)
        .with(FunctionPattern)
        .with(LinkPattern)
        .with(UnarySignPattern)
        .with(DeclarationPattern)
        .with(WhilePattern)
        .with(IfPattern)
        .with(BinaryPattern)
        .with(ReturnPattern)
        .with(SingletonPattern)
});

impl PatternSet {
    /// Every pattern of the language, registered once per process.
    pub fn standard() -> &'static PatternSet {
        &STANDARD
    }
}

// ============================================================================
// TOKEN UNWRAPPING
// ============================================================================

fn identifier(token: Token) -> ParseResult<(SmolStr, Span)> {
    match token.kind {
        TokenKind::Identifier(name) => Ok((name, token.span)),
        _ => Err(ParseError::Expected { expected: "a name", position: token.span.start }),
    }
}

fn block(token: Token) -> ParseResult<ContentToken> {
    match token.kind {
        TokenKind::Content(content) if content.kind == ParenthesisKind::Curly => Ok(content),
        _ => Err(ParseError::Expected { expected: "a '{' block", position: token.span.start }),
    }
}

fn function(token: Token) -> ParseResult<FunctionToken> {
    match token.kind {
        TokenKind::Function(function) => Ok(function),
        _ => Err(ParseError::Expected { expected: "a signature", position: token.span.start }),
    }
}

fn is_block(token: Option<&Token>) -> bool {
    token.is_some_and(|token| token.is_content_of(ParenthesisKind::Curly))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::base::FileId;
    use crate::parser::engine::{Parser, PatternSet};
    use crate::parser::lexer::tokenize;
    use crate::parser::result::ParseResult;
    use crate::syntax::{ContextId, NodeId, SyntaxTree, VariableCategory};

    /// A file parsed with the standard patterns.
    pub struct Parsed {
        pub tree: SyntaxTree,
        pub context: ContextId,
        pub root: NodeId,
    }

    pub fn parse_as(text: &str, category: VariableCategory) -> ParseResult<Parsed> {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let context = tree.new_context();
        let root = {
            let mut parser = Parser::new(PatternSet::standard(), &mut tree, category);
            parser.parse(context, tokenize(text)?)?
        };
        Ok(Parsed { tree, context, root })
    }

    /// Parse as a function body, where new names are locals.
    pub fn parse(text: &str) -> ParseResult<Parsed> {
        parse_as(text, VariableCategory::Local)
    }

    /// Parse and render the outline.
    pub fn dump(text: &str) -> String {
        match parse(text) {
            Ok(parsed) => parsed.tree.dump(parsed.root),
            Err(error) => panic!("parse failed: {}", error),
        }
    }
}
