//! Lexical scopes.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smol_str::SmolStr;

use super::{NodeId, TypeRef};
use crate::base::{FileId, Span};

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Index of a context in a [`SyntaxTree`](super::SyntaxTree).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ContextId(pub(crate) u32);

impl ContextId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn shifted(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

/// Where a variable was declared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableCategory {
    Global,
    Member,
    Parameter,
    Local,
}

impl VariableCategory {
    /// Whether a declaration in this category may name a type that is not
    /// known yet. File level and type bodies leave those to the resolver.
    pub fn defers_types(self) -> bool {
        matches!(self, VariableCategory::Global | VariableCategory::Member)
    }
}

/// A declared variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: SmolStr,
    pub ty: TypeRef,
    pub category: VariableCategory,
    pub span: Span,
    pub file: FileId,
}

/// A lexical scope: declarations by name plus the enclosing scope.
///
/// Declaration maps keep insertion order, so iterating a merged context
/// follows file order.
#[derive(Clone, Debug, Default)]
pub struct Context {
    pub(crate) parent: Option<ContextId>,
    pub(crate) children: Vec<ContextId>,
    pub(crate) types: FxIndexMap<SmolStr, NodeId>,
    pub(crate) functions: FxIndexMap<SmolStr, NodeId>,
    pub(crate) variables: FxIndexMap<SmolStr, Variable>,
}

impl Context {
    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    pub fn types(&self) -> impl Iterator<Item = (&SmolStr, NodeId)> + '_ {
        self.types.iter().map(|(name, &node)| (name, node))
    }

    pub fn functions(&self) -> impl Iterator<Item = (&SmolStr, NodeId)> + '_ {
        self.functions.iter().map(|(name, &node)| (name, node))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.values()
    }

    pub fn local_type(&self, name: &str) -> Option<NodeId> {
        self.types.get(name).copied()
    }

    pub fn local_function(&self, name: &str) -> Option<NodeId> {
        self.functions.get(name).copied()
    }

    pub fn local_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.functions.is_empty() && self.variables.is_empty()
    }

    pub(crate) fn shift(&mut self, nodes: u32, contexts: u32) {
        self.parent = self.parent.map(|id| id.shifted(contexts));
        for child in &mut self.children {
            *child = child.shifted(contexts);
        }
        for node in self.types.values_mut().chain(self.functions.values_mut()) {
            *node = node.shifted(nodes);
        }
        for variable in self.variables.values_mut() {
            variable.ty.shift(nodes);
        }
    }
}
