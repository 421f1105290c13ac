//! Expressions: member access, signs, binary operators and lone operands.

use super::declare::fresh_name;
use crate::parser::engine::Parser;
use crate::parser::keywords::Operator;
use crate::parser::pattern::{Pattern, Window};
use crate::parser::result::{ParseError, ParseResult};
use crate::parser::token::{TokenKind, TokenType};
use crate::syntax::{ContextId, NameRole, NodeId, NodeKind, TypeRef, Variable};

// ============================================================================
// LINK
// ============================================================================

/// `object.member` and `object.method(args)`.
///
/// The member is looked up in the scope of the object's declared type,
/// once that type is known. Primitives have no members.
pub struct LinkPattern;

impl Pattern for LinkPattern {
    fn name(&self) -> &'static str {
        "link"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::OBJECT,
            TokenType::OPERATOR,
            TokenType::IDENTIFIER.union(TokenType::FUNCTION),
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        19
    }

    fn passes(&self, window: &Window) -> bool {
        window.is_value(0) && window.operator(1) == Some(Operator::Dot)
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let object = window.require(0, "an object")?;
        let member = window.require(2, "a member")?;

        let object = parser.operand(context, object)?;
        let ty = parser.tree().value_type(object);

        let (name, position) = match &member.kind {
            TokenKind::Identifier(name) => (name.clone(), member.span.start),
            TokenKind::Function(function) => (function.name.clone(), function.name_span.start),
            _ => return Err(ParseError::Expected { expected: "a member name", position: member.span.start }),
        };
        if let TypeRef::Primitive(_) = ty {
            return Err(ParseError::UnknownMember {
                name,
                owner: parser.tree().type_name(&ty),
                position,
            });
        }

        let member = match member.kind {
            TokenKind::Function(function) => {
                let kind = NodeKind::Unresolved { name, context, role: NameRole::Method };
                // Arguments are evaluated in the caller's scope
                parser.call_with(context, kind, &function, member.span)?
            }
            _ => {
                let kind = NodeKind::Unresolved { name, context, role: NameRole::Member };
                parser.tree_mut().alloc(kind, member.span)
            }
        };

        let tree = parser.tree_mut();
        let node = tree.alloc(NodeKind::Link, span);
        tree.add(node, object);
        tree.add(node, member);
        tree.bind(member);
        Ok(node)
    }
}

// ============================================================================
// UNARY SIGN
// ============================================================================

/// `-x` and `+x` where the sign cannot be a binary operator.
///
/// The first slot looks behind the sign: a sign is unary after another
/// operator, after a keyword, or at the start of a statement.
pub struct UnarySignPattern;

impl Pattern for UnarySignPattern {
    fn name(&self) -> &'static str {
        "unary sign"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::OPERATOR.union(TokenType::KEYWORD).union(TokenType::OPTIONAL),
            TokenType::OPERATOR,
            TokenType::OBJECT,
        ];
        SLOTS
    }

    fn start(&self) -> usize {
        1
    }

    fn priority(&self, _window: &Window) -> u32 {
        18
    }

    fn passes(&self, window: &Window) -> bool {
        let sign = matches!(window.operator(1), Some(Operator::Add | Operator::Subtract));
        let unary = window.has(0) || window.get(1).is_some_and(|token| token.starts_line());
        sign && unary && window.is_value(2)
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let negate = window.operator(1) == Some(Operator::Subtract);
        let operand = window.require(2, "an operand")?;
        let operand = parser.operand(context, operand)?;

        if !negate {
            return Ok(operand);
        }

        let tree = parser.tree_mut();
        if let NodeKind::Number(value) = tree.kind(operand) {
            let value = value.negated();
            return Ok(tree.alloc(NodeKind::Number(value), span));
        }

        let node = tree.alloc(NodeKind::Negate, span);
        tree.add(node, operand);
        Ok(node)
    }
}

// ============================================================================
// BINARY
// ============================================================================

/// `left op right`, ranked by the operator's precedence.
///
/// Assigning with `=` to a name not visible from the current scope declares
/// it there, typed after the right-hand side. A right-hand side whose type
/// is not known yet leaves the type to [`SyntaxTree::settle`].
///
/// [`SyntaxTree::settle`]: crate::syntax::SyntaxTree::settle
pub struct BinaryPattern;

impl Pattern for BinaryPattern {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[TokenType::OBJECT, TokenType::OPERATOR, TokenType::OBJECT];
        SLOTS
    }

    fn priority(&self, window: &Window) -> u32 {
        window.operator(1).and_then(Operator::precedence).unwrap_or(0)
    }

    fn passes(&self, window: &Window) -> bool {
        window.operator(1).is_some_and(Operator::is_binary) && window.is_value(0) && window.is_value(2)
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let Some(operator) = window.operator(1) else {
            return Err(ParseError::Expected { expected: "an operator", position: window.position() });
        };
        let left = window.require(0, "an operand")?;
        let right = window.require(2, "an operand")?;

        let right = parser.operand(context, right)?;

        let declared = match operator {
            Operator::Assign => fresh_name(parser, context, &left),
            _ => None,
        };
        let left = match declared {
            Some(name) => {
                let category = parser.category();
                let tree = parser.tree_mut();
                let ty = Some(tree.value_type(right))
                    .filter(TypeRef::is_resolved)
                    .unwrap_or(TypeRef::Unknown);
                let file = tree.file();
                tree.declare_variable(
                    context,
                    Variable {
                        name: name.clone(),
                        ty,
                        category,
                        span: left.span,
                        file,
                    },
                )?;
                tree.alloc(NodeKind::Variable { name, context }, left.span)
            }
            None => parser.operand(context, left)?,
        };

        let tree = parser.tree_mut();
        if operator.is_assignment()
            && !matches!(
                tree.kind(left),
                NodeKind::Variable { .. }
                    | NodeKind::Declaration { .. }
                    | NodeKind::Link
                    | NodeKind::Unresolved { role: NameRole::Value | NameRole::Member, .. }
            )
        {
            return Err(ParseError::Expected {
                expected: "an assignable value",
                position: tree.span(left).start,
            });
        }

        let node = tree.alloc(NodeKind::Operator(operator), span);
        tree.add(node, left);
        tree.add(node, right);
        Ok(node)
    }
}

// ============================================================================
// SINGLETON
// ============================================================================

/// A lone name, number or call forming a whole statement.
pub struct SingletonPattern;

impl Pattern for SingletonPattern {
    fn name(&self) -> &'static str {
        "singleton"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::IDENTIFIER.union(TokenType::NUMBER).union(TokenType::FUNCTION),
            TokenType::END,
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        0
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let token = window.require(0, "an operand")?;
        parser.operand(context, token)
    }
}
