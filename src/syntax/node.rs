//! Syntax tree nodes.

use std::fmt;

use smol_str::SmolStr;

use super::ContextId;
use crate::base::{FileId, Span};
use crate::hir::Primitive;
use crate::parser::keywords::Operator;
use crate::parser::token::{ContentToken, NumberValue};

/// Index of a node in a [`SyntaxTree`](super::SyntaxTree).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn shifted(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Resolution state of a type or function declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Unparsed,
    Parsing,
    Resolved,
    Failed,
}

/// What a variable, parameter or return value is declared as.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No annotation and nothing to infer from
    Unknown,
    /// Annotated name not yet looked up
    Unresolved(SmolStr),
    Primitive(Primitive),
    /// A declared type node
    Declared(NodeId),
}

impl TypeRef {
    /// Whether this names a concrete type.
    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeRef::Primitive(_) | TypeRef::Declared(_))
    }

    pub(crate) fn shift(&mut self, offset: u32) {
        if let TypeRef::Declared(node) = self {
            *node = node.shifted(offset);
        }
    }
}

/// How a name that could not be bound yet was used.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NameRole {
    /// A variable read or assigned.
    Value,
    /// A call of a function or a construction of a type.
    Call,
    /// A member read through a link; the object is the previous sibling.
    Member,
    /// A member function called through a link.
    Method,
}

/// A type declaration. Its members are parsed by the resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeNode {
    pub name: SmolStr,
    pub status: Status,
    pub body: ContentToken,
}

/// A function parameter `name[: Type]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: SmolStr,
    pub ty: TypeRef,
    pub span: Span,
}

/// A function declaration. Its body is parsed by the resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionNode {
    pub name: SmolStr,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    pub status: Status,
    pub body: ContentToken,
}

/// The role of a node.
///
/// Child layout is fixed per kind and documented on each variant.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Statement list: a file root, a block body, or the merged program.
    Block,
    /// Parenthesized group, one child per comma-separated step.
    Group,
    /// Placeholder for an omitted loop step.
    Empty,
    Number(NumberValue),
    /// Use of a variable declared in `context`.
    Variable { name: SmolStr, context: ContextId },
    /// `name: Type`, declared in `context`.
    Declaration { name: SmolStr, context: ContextId },
    /// A name not visible when its statement was built, bound later.
    /// Calls keep their arguments as children.
    Unresolved {
        name: SmolStr,
        context: ContextId,
        role: NameRole,
    },
    /// Call of a declared function; children are the arguments.
    Call { function: NodeId },
    /// Construction of a declared type; children are the arguments.
    Construction { ty: NodeId },
    /// Binary operation; children are the two operands.
    Operator(Operator),
    /// Arithmetic negation of the only child.
    Negate,
    /// Member access; children are the object and the member.
    Link,
    /// Children: the returned value.
    Return,
    /// Children: the step group `{initializer, condition, increment}`, then the body.
    While,
    /// Children: the condition, the body, and optionally the else body.
    If,
    Type(TypeNode),
    Function(FunctionNode),
}

impl NodeKind {
    /// Whether a node of this kind produces a value.
    pub fn is_value(&self) -> bool {
        match self {
            NodeKind::Group
            | NodeKind::Number(_)
            | NodeKind::Variable { .. }
            | NodeKind::Declaration { .. }
            | NodeKind::Unresolved { .. }
            | NodeKind::Call { .. }
            | NodeKind::Construction { .. }
            | NodeKind::Operator(_)
            | NodeKind::Negate
            | NodeKind::Link => true,
            NodeKind::Block
            | NodeKind::Empty
            | NodeKind::Return
            | NodeKind::While
            | NodeKind::If
            | NodeKind::Type(_)
            | NodeKind::Function(_) => false,
        }
    }

    /// Short label used by tree dumps.
    pub fn label(&self) -> String {
        match self {
            NodeKind::Block => "Block".to_string(),
            NodeKind::Group => "Group".to_string(),
            NodeKind::Empty => "Empty".to_string(),
            NodeKind::Number(value) => format!("Number {}", value),
            NodeKind::Variable { name, .. } => format!("Variable {}", name),
            NodeKind::Declaration { name, .. } => format!("Declaration {}", name),
            NodeKind::Unresolved { name, .. } => format!("Unresolved {}", name),
            NodeKind::Call { .. } => "Call".to_string(),
            NodeKind::Construction { .. } => "Construction".to_string(),
            NodeKind::Operator(operator) => format!("Operator {}", operator),
            NodeKind::Negate => "Negate".to_string(),
            NodeKind::Link => "Link".to_string(),
            NodeKind::Return => "Return".to_string(),
            NodeKind::While => "While".to_string(),
            NodeKind::If => "If".to_string(),
            NodeKind::Type(ty) => format!("Type {} [{:?}]", ty.name, ty.status),
            NodeKind::Function(function) => {
                format!("Function {} [{:?}]", function.name, function.status)
            }
        }
    }

    pub(crate) fn shift(&mut self, nodes: u32, contexts: u32) {
        match self {
            NodeKind::Variable { context, .. }
            | NodeKind::Declaration { context, .. }
            | NodeKind::Unresolved { context, .. } => {
                *context = context.shifted(contexts);
            }
            NodeKind::Call { function } => *function = function.shifted(nodes),
            NodeKind::Construction { ty } => *ty = ty.shifted(nodes),
            NodeKind::Function(function) => {
                function.return_type.shift(nodes);
                for parameter in &mut function.parameters {
                    parameter.ty.shift(nodes);
                }
            }
            NodeKind::Block
            | NodeKind::Group
            | NodeKind::Empty
            | NodeKind::Number(_)
            | NodeKind::Operator(_)
            | NodeKind::Negate
            | NodeKind::Link
            | NodeKind::Return
            | NodeKind::While
            | NodeKind::If
            | NodeKind::Type(_) => {}
        }
    }

    /// Point a scope reference at `to` if it names `from`.
    pub(crate) fn retarget(&mut self, from: ContextId, to: ContextId) {
        match self {
            NodeKind::Variable { context, .. }
            | NodeKind::Declaration { context, .. }
            | NodeKind::Unresolved { context, .. }
                if *context == from =>
            {
                *context = to;
            }
            _ => {}
        }
    }
}

/// Arena slot of a node.
///
/// Ownership runs parent → children; the sibling and parent links are plain
/// indices used for traversal only.
#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub span: Span,
    pub file: FileId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) previous: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    /// Private scope owned by this node
    pub(crate) context: Option<ContextId>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind, span: Span, file: FileId) -> Self {
        Self {
            kind,
            span,
            file,
            parent: None,
            previous: None,
            next: None,
            first: None,
            last: None,
            context: None,
        }
    }

    pub(crate) fn shift(&mut self, nodes: u32, contexts: u32) {
        self.kind.shift(nodes, contexts);
        for link in [
            &mut self.parent,
            &mut self.previous,
            &mut self.next,
            &mut self.first,
            &mut self.last,
        ] {
            *link = link.map(|id| id.shifted(nodes));
        }
        self.context = self.context.map(|id| id.shifted(contexts));
    }
}
