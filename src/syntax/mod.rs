//! Tree model: nodes, scopes and the arena that owns them.
//!
//! Nodes and contexts live in a [`SyntaxTree`] and refer to each other by
//! index, so a file tree can be moved into the program tree by shifting ids.

mod context;
mod node;
mod tree;

pub use context::{Context, ContextId, Variable, VariableCategory};
pub use node::{
    FunctionNode, NameRole, NodeData, NodeId, NodeKind, Parameter, Status, TypeNode, TypeRef,
};
pub use tree::{Children, MergeConflict, SyntaxTree, TreeError};
