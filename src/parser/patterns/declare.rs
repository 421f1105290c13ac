//! Declarations: types, functions and typed variables.

use smol_str::SmolStr;
use tracing::trace;

use super::{block, function, identifier, is_block};
use crate::parser::engine::Parser;
use crate::parser::keywords::{Keyword, Operator};
use crate::parser::pattern::{Pattern, Window};
use crate::parser::result::{ParseError, ParseResult};
use crate::parser::token::{ContentToken, Token, TokenKind, TokenType};
use crate::syntax::{
    ContextId, FunctionNode, NodeId, NodeKind, Parameter, Status, TypeNode, TypeRef, Variable,
};

// ============================================================================
// TYPE
// ============================================================================

/// `type Name { members }`
///
/// The body is kept as raw content and parsed by the resolver, once every
/// type of the program is known.
pub struct TypePattern;

impl Pattern for TypePattern {
    fn name(&self) -> &'static str {
        "type"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::KEYWORD,
            TokenType::IDENTIFIER,
            TokenType::END.union(TokenType::OPTIONAL),
            TokenType::CONTENT,
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        20
    }

    fn passes(&self, window: &Window) -> bool {
        window.keyword(0) == Some(Keyword::Type) && is_block(window.get(3))
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let (name, name_span) = identifier(window.require(1, "a type name")?)?;
        let body = block(window.require(3, "a type body")?)?;

        let tree = parser.tree_mut();
        let node = tree.alloc(
            NodeKind::Type(TypeNode {
                name: name.clone(),
                status: Status::Unparsed,
                body,
            }),
            span,
        );
        let scope = tree.child_context(context)?;
        tree.set_context(node, scope);
        tree.declare_type(context, name.clone(), node, name_span.start)?;

        trace!(name = %name, "declared type");
        Ok(node)
    }
}

// ============================================================================
// FUNCTION
// ============================================================================

/// `func name(a: Type, b) [: Return] { body }`
///
/// Parameter and return types stay unresolved names until the resolver's
/// function pass; the body is parsed there too.
pub struct FunctionPattern;

impl Pattern for FunctionPattern {
    fn name(&self) -> &'static str {
        "function"
    }

    fn slots(&self) -> &[TokenType] {
        const SLOTS: &[TokenType] = &[
            TokenType::KEYWORD,
            TokenType::FUNCTION,
            TokenType::OPERATOR.union(TokenType::OPTIONAL),
            TokenType::IDENTIFIER.union(TokenType::OPTIONAL),
            TokenType::END.union(TokenType::OPTIONAL),
            TokenType::CONTENT,
        ];
        SLOTS
    }

    fn priority(&self, _window: &Window) -> u32 {
        20
    }

    fn passes(&self, window: &Window) -> bool {
        let return_type = match (window.operator(2), window.has(3)) {
            (Some(Operator::Colon), true) => true,
            (None, false) => !window.has(2),
            _ => false,
        };

        window.keyword(0) == Some(Keyword::Func) && return_type && is_block(window.get(5))
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let signature = function(window.require(1, "a function signature")?)?;
        let return_type = match window.take(3) {
            Some(token) => TypeRef::Unresolved(identifier(token)?.0),
            None => TypeRef::Unknown,
        };
        let body = block(window.require(5, "a function body")?)?;
        let parameters = parameters(&signature.parameters)?;

        let tree = parser.tree_mut();
        let node = tree.alloc(
            NodeKind::Function(FunctionNode {
                name: signature.name.clone(),
                parameters,
                return_type,
                status: Status::Unparsed,
                body,
            }),
            span,
        );
        let scope = tree.child_context(context)?;
        tree.set_context(node, scope);
        tree.declare_function(context, signature.name.clone(), node, signature.name_span.start)?;

        trace!(name = %signature.name, "declared function");
        Ok(node)
    }
}

/// Split `(a: T, b)` into parameters.
fn parameters(content: &ContentToken) -> ParseResult<Vec<Parameter>> {
    let tokens = content.tokens()?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    tokens
        .split(|token| token.operator() == Some(Operator::Comma))
        .map(|group| parameter(group, content))
        .collect()
}

fn parameter(tokens: &[Token], content: &ContentToken) -> ParseResult<Parameter> {
    let expected = |position| ParseError::Expected {
        expected: "a parameter 'name' or 'name: Type'",
        position,
    };

    match tokens {
        [name] => {
            let (name, span) = identifier(name.clone())?;
            Ok(Parameter { name, ty: TypeRef::Unknown, span })
        }
        [name, colon, ty] if colon.operator() == Some(Operator::Colon) => {
            let (name, span) = identifier(name.clone())?;
            let (ty, ty_span) = identifier(ty.clone())?;
            Ok(Parameter {
                name,
                ty: TypeRef::Unresolved(ty),
                span: span.cover(ty_span),
            })
        }
        [] => Err(expected(content.inner_start())),
        [first, ..] => Err(expected(first.span.start)),
    }
}

// ============================================================================
// DECLARATION
// ============================================================================

/// `name: Type` declares a variable in the current scope.
///
/// At file level and in type bodies an unknown type name is left for the
/// resolver. In function bodies it is an error.
pub struct DeclarationPattern;

impl Pattern for DeclarationPattern {
    fn name(&self) -> &'static str {
        "declaration"
    }

    fn slots(&self) -> &[TokenType] {
        &[TokenType::IDENTIFIER, TokenType::OPERATOR, TokenType::IDENTIFIER]
    }

    fn priority(&self, _window: &Window) -> u32 {
        17
    }

    fn passes(&self, window: &Window) -> bool {
        window.operator(1) == Some(Operator::Colon)
    }

    fn build(&self, parser: &mut Parser<'_>, context: ContextId, mut window: Window) -> ParseResult<NodeId> {
        let span = window.span();
        let (name, name_span) = identifier(window.require(0, "a variable name")?)?;
        let (ty_name, ty_span) = identifier(window.require(2, "a type name")?)?;
        let category = parser.category();

        let tree = parser.tree_mut();
        let ty = match tree.lookup_type_ref(context, &ty_name) {
            Some(ty) => ty,
            None if category.defers_types() => TypeRef::Unresolved(ty_name),
            None => {
                return Err(ParseError::UnresolvedType {
                    name: ty_name,
                    position: ty_span.start,
                });
            }
        };

        let file = tree.file();
        tree.declare_variable(
            context,
            Variable {
                name: name.clone(),
                ty,
                category,
                span: name_span,
                file,
            },
        )?;

        Ok(tree.alloc(NodeKind::Declaration { name, context }, span))
    }
}

/// Whether `token` names something that can be declared by assignment.
pub(super) fn fresh_name(parser: &Parser<'_>, context: ContextId, token: &Token) -> Option<SmolStr> {
    match &token.kind {
        TokenKind::Identifier(name) if parser.tree().lookup_variable(context, name).is_none() => {
            Some(name.clone())
        }
        _ => None,
    }
}
