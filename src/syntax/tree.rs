//! Arena holding the nodes and contexts of one or more parsed files.

use std::fmt::Write as _;

use smol_str::SmolStr;
use thiserror::Error;

use super::context::{Context, ContextId, Variable, VariableCategory};
use super::node::{NameRole, NodeData, NodeId, NodeKind, TypeRef};
use crate::base::{FileId, Position, Span};
use crate::hir::{Primitive, is_primitive_type};
use crate::parser::keywords::Operator;
use crate::parser::result::{ParseError, ParseResult};

/// Misuse of the tree structure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("context {0:?} is already linked to a parent")]
    AlreadyLinked(ContextId),
}

/// A declaration that a merge dropped because its name was already taken.
///
/// The declaration that was merged first stays visible.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeConflict {
    pub kind: &'static str,
    pub name: SmolStr,
    pub span: Span,
    pub file: FileId,
}

/// Nodes and contexts addressed by stable indices.
///
/// Each file is parsed into its own tree; [`SyntaxTree::merge_tree`] moves a
/// file tree into the program tree, shifting its indices.
#[derive(Clone, Debug, Default)]
pub struct SyntaxTree {
    file: FileId,
    nodes: Vec<NodeData>,
    contexts: Vec<Context>,
}

impl SyntaxTree {
    /// Create an empty tree whose new nodes belong to `file`.
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            nodes: Vec::new(),
            contexts: Vec::new(),
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    /// Stamp nodes allocated from now on with `file`.
    ///
    /// The program tree parses declaration bodies of many files.
    pub fn set_file(&mut self, file: FileId) {
        self.file = file;
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // NODES
    // ========================================================================

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind, span, self.file));
        id
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn first(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].first
    }

    pub fn last(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].last
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].next
    }

    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].previous
    }

    /// The private scope owned by a node, if any.
    pub fn context_of(&self, id: NodeId) -> Option<ContextId> {
        self.nodes[id.index()].context
    }

    pub fn set_context(&mut self, id: NodeId, context: ContextId) {
        self.nodes[id.index()].context = Some(context);
    }

    /// Iterate over the children of a node, in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Append a detached node as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "node is already attached");

        let last = self.last(parent);
        {
            let data = &mut self.nodes[child.index()];
            data.parent = Some(parent);
            data.previous = last;
            data.next = None;
        }

        match last {
            Some(last) => self.nodes[last.index()].next = Some(child),
            None => self.nodes[parent.index()].first = Some(child),
        }
        self.nodes[parent.index()].last = Some(child);
    }

    /// Insert a detached node right before `before`, under the same parent.
    pub fn insert(&mut self, before: NodeId, node: NodeId) {
        debug_assert!(self.parent(node).is_none(), "node is already attached");

        let parent = self.parent(before);
        let previous = self.previous(before);
        {
            let data = &mut self.nodes[node.index()];
            data.parent = parent;
            data.previous = previous;
            data.next = Some(before);
        }
        self.nodes[before.index()].previous = Some(node);

        match previous {
            Some(previous) => self.nodes[previous.index()].next = Some(node),
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first = Some(node);
                }
            }
        }
    }

    /// Unlink a node from its parent and siblings. Its own children stay.
    pub fn detach(&mut self, node: NodeId) {
        let data = &self.nodes[node.index()];
        let (parent, previous, next) = (data.parent, data.previous, data.next);

        match previous {
            Some(previous) => self.nodes[previous.index()].next = next,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].first = next;
                }
            }
        }

        match next {
            Some(next) => self.nodes[next.index()].previous = previous,
            None => {
                if let Some(parent) = parent {
                    self.nodes[parent.index()].last = previous;
                }
            }
        }

        let data = &mut self.nodes[node.index()];
        data.parent = None;
        data.previous = None;
        data.next = None;
    }

    /// Move every child of `from` to the end of `into`, preserving order.
    pub fn merge(&mut self, into: NodeId, from: NodeId) {
        let mut iterator = self.first(from);

        while let Some(child) = iterator {
            iterator = self.next(child);
            self.detach(child);
            self.add(into, child);
        }
    }

    // ========================================================================
    // CONTEXTS
    // ========================================================================

    /// Create a context with no parent.
    pub fn new_context(&mut self) -> ContextId {
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(Context::default());
        id
    }

    /// Create a context linked to `parent`.
    pub fn child_context(&mut self, parent: ContextId) -> Result<ContextId, TreeError> {
        let id = self.new_context();
        self.link(id, parent)?;
        Ok(id)
    }

    /// Set the enclosing scope of `context`. A context is linked at most once.
    pub fn link(&mut self, context: ContextId, parent: ContextId) -> Result<(), TreeError> {
        if self.contexts[context.index()].parent.is_some() {
            return Err(TreeError::AlreadyLinked(context));
        }

        self.contexts[context.index()].parent = Some(parent);
        self.contexts[parent.index()].children.push(context);
        Ok(())
    }

    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.index()]
    }

    pub fn context_mut(&mut self, id: ContextId) -> &mut Context {
        &mut self.contexts[id.index()]
    }

    /// Every context in the arena, in creation order.
    pub fn context_ids(&self) -> impl Iterator<Item = ContextId> + use<> {
        (0..self.contexts.len() as u32).map(ContextId)
    }

    /// The context itself, then each enclosing context outwards.
    pub fn scope_chain(&self, context: ContextId) -> impl Iterator<Item = ContextId> + '_ {
        std::iter::successors(Some(context), move |&id| self.contexts[id.index()].parent)
    }

    pub fn declare_type(
        &mut self,
        context: ContextId,
        name: SmolStr,
        node: NodeId,
        position: Position,
    ) -> ParseResult<()> {
        let types = &mut self.contexts[context.index()].types;
        if types.contains_key(&name) {
            return Err(ParseError::Duplicate { kind: "type", name, position });
        }
        types.insert(name, node);
        Ok(())
    }

    pub fn declare_function(
        &mut self,
        context: ContextId,
        name: SmolStr,
        node: NodeId,
        position: Position,
    ) -> ParseResult<()> {
        let functions = &mut self.contexts[context.index()].functions;
        if functions.contains_key(&name) {
            return Err(ParseError::Duplicate { kind: "function", name, position });
        }
        functions.insert(name, node);
        Ok(())
    }

    pub fn declare_variable(&mut self, context: ContextId, variable: Variable) -> ParseResult<()> {
        let variables = &mut self.contexts[context.index()].variables;
        if variables.contains_key(&variable.name) {
            return Err(ParseError::Duplicate {
                kind: "variable",
                name: variable.name,
                position: variable.span.start,
            });
        }
        variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Find a type by walking the scope chain outwards.
    pub fn lookup_type(&self, context: ContextId, name: &str) -> Option<NodeId> {
        self.scope_chain(context)
            .find_map(|id| self.contexts[id.index()].local_type(name))
    }

    /// Find a function by walking the scope chain outwards.
    pub fn lookup_function(&self, context: ContextId, name: &str) -> Option<NodeId> {
        self.scope_chain(context)
            .find_map(|id| self.contexts[id.index()].local_function(name))
    }

    /// Find a variable by walking the scope chain outwards.
    ///
    /// Returns the context that declares it along with the declaration.
    pub fn lookup_variable(&self, context: ContextId, name: &str) -> Option<(ContextId, &Variable)> {
        self.scope_chain(context).find_map(|id| {
            self.contexts[id.index()]
                .local_variable(name)
                .map(|variable| (id, variable))
        })
    }

    /// Union the declarations of `from` into `into`.
    ///
    /// A name already declared in `into` keeps its first declaration; the
    /// dropped one is reported. The scopes linked under `from` are adopted
    /// by `into`, nodes that referred to `from` now refer to `into`, and
    /// `from` is left empty.
    pub fn merge_context(&mut self, into: ContextId, from: ContextId) -> Vec<MergeConflict> {
        let source = std::mem::take(&mut self.contexts[from.index()]);
        let mut conflicts = Vec::new();

        for (name, node) in source.types {
            if self.contexts[into.index()].types.contains_key(&name) {
                conflicts.push(self.conflict("type", name, node));
            } else {
                self.contexts[into.index()].types.insert(name, node);
            }
        }

        for (name, node) in source.functions {
            if self.contexts[into.index()].functions.contains_key(&name) {
                conflicts.push(self.conflict("function", name, node));
            } else {
                self.contexts[into.index()].functions.insert(name, node);
            }
        }

        for (name, variable) in source.variables {
            if self.contexts[into.index()].variables.contains_key(&name) {
                conflicts.push(MergeConflict {
                    kind: "variable",
                    name,
                    span: variable.span,
                    file: variable.file,
                });
            } else {
                self.contexts[into.index()].variables.insert(name, variable);
            }
        }

        for child in source.children {
            self.contexts[child.index()].parent = Some(into);
            self.contexts[into.index()].children.push(child);
        }

        for data in &mut self.nodes {
            data.kind.retarget(from, into);
        }

        conflicts
    }

    fn conflict(&self, kind: &'static str, name: SmolStr, node: NodeId) -> MergeConflict {
        let data = self.node(node);
        MergeConflict {
            kind,
            name,
            span: data.span,
            file: data.file,
        }
    }

    /// Move a whole file tree into this tree.
    ///
    /// The file's root children are appended to `root` and its top-level
    /// context is merged into `context`.
    pub fn merge_tree(
        &mut self,
        root: NodeId,
        context: ContextId,
        other: SyntaxTree,
        other_root: NodeId,
        other_context: ContextId,
    ) -> Vec<MergeConflict> {
        let (nodes, contexts) = self.absorb(other);
        let other_root = other_root.shifted(nodes);
        let other_context = other_context.shifted(contexts);

        self.merge(root, other_root);
        self.merge_context(context, other_context)
    }

    /// Append another arena, returning the index offsets applied to it.
    fn absorb(&mut self, other: SyntaxTree) -> (u32, u32) {
        let nodes = self.nodes.len() as u32;
        let contexts = self.contexts.len() as u32;

        self.nodes.extend(other.nodes.into_iter().map(|mut data| {
            data.shift(nodes, contexts);
            data
        }));
        self.contexts.extend(other.contexts.into_iter().map(|mut context| {
            context.shift(nodes, contexts);
            context
        }));

        (nodes, contexts)
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    /// Resolve a type name visible from `context`, primitives first.
    pub fn lookup_type_ref(&self, context: ContextId, name: &str) -> Option<TypeRef> {
        if let Some(primitive) = is_primitive_type(name) {
            return Some(TypeRef::Primitive(primitive));
        }
        self.lookup_type(context, name).map(TypeRef::Declared)
    }

    /// Display name of a type reference.
    pub fn type_name(&self, ty: &TypeRef) -> SmolStr {
        match ty {
            TypeRef::Unknown => SmolStr::new_static("unknown"),
            TypeRef::Unresolved(name) => name.clone(),
            TypeRef::Primitive(primitive) => SmolStr::new_static(primitive.name()),
            TypeRef::Declared(node) => match self.kind(*node) {
                NodeKind::Type(ty) => ty.name.clone(),
                _ => SmolStr::new_static("unknown"),
            },
        }
    }

    /// Best-effort type of the value a node produces.
    pub fn value_type(&self, node: NodeId) -> TypeRef {
        match self.kind(node) {
            NodeKind::Number(value) => TypeRef::Primitive(Primitive::of_literal(value)),
            NodeKind::Variable { name, context } | NodeKind::Declaration { name, context } => self
                .context(*context)
                .local_variable(name)
                .map(|variable| variable.ty.clone())
                .unwrap_or(TypeRef::Unknown),
            NodeKind::Call { function } => match self.kind(*function) {
                NodeKind::Function(function) => function.return_type.clone(),
                _ => TypeRef::Unknown,
            },
            NodeKind::Construction { ty } => TypeRef::Declared(*ty),
            NodeKind::Operator(operator) if operator.is_comparison() => {
                TypeRef::Primitive(Primitive::Bool)
            }
            NodeKind::Operator(_) | NodeKind::Negate => self
                .first(node)
                .map(|first| self.value_type(first))
                .unwrap_or(TypeRef::Unknown),
            NodeKind::Link => self
                .last(node)
                .map(|last| self.value_type(last))
                .unwrap_or(TypeRef::Unknown),
            NodeKind::Group if self.child_count(node) == 1 => self
                .first(node)
                .map(|first| self.value_type(first))
                .unwrap_or(TypeRef::Unknown),
            _ => TypeRef::Unknown,
        }
    }

    // ========================================================================
    // BINDING
    // ========================================================================

    /// Bind a placeholder to the declaration its name refers to now.
    ///
    /// Returns whether the node changed.
    pub fn bind(&mut self, node: NodeId) -> bool {
        let NodeKind::Unresolved { name, context, role } = self.kind(node) else {
            return false;
        };

        let bound = match role {
            NameRole::Value => self
                .lookup_variable(*context, name)
                .map(|(owner, _)| NodeKind::Variable { name: name.clone(), context: owner }),
            NameRole::Call => match self.lookup_function(*context, name) {
                Some(function) => Some(NodeKind::Call { function }),
                None => self
                    .lookup_type(*context, name)
                    .map(|ty| NodeKind::Construction { ty }),
            },
            NameRole::Member => self.member_scope(node).and_then(|scope| {
                self.context(scope)
                    .local_variable(name)
                    .map(|_| NodeKind::Variable { name: name.clone(), context: scope })
            }),
            NameRole::Method => self
                .member_scope(node)
                .and_then(|scope| self.context(scope).local_function(name))
                .map(|function| NodeKind::Call { function }),
        };

        match bound {
            Some(kind) => {
                self.nodes[node.index()].kind = kind;
                true
            }
            None => false,
        }
    }

    /// Bind every placeholder under `root` and type the variables assigned
    /// there, until nothing changes.
    ///
    /// Bodies of types and functions below `root` are left alone. Returns
    /// the placeholders still unbound, in tree order.
    pub fn settle(&mut self, root: NodeId) -> Vec<NodeId> {
        let nodes = self.statement_nodes(root);

        loop {
            let mut changed = false;
            for &node in &nodes {
                changed |= self.bind(node) || self.infer(node);
            }
            if !changed {
                break;
            }
        }

        nodes
            .into_iter()
            .filter(|&node| matches!(self.kind(node), NodeKind::Unresolved { .. }))
            .collect()
    }

    /// Display name of the type a member placeholder is looked up in.
    pub fn member_owner(&self, member: NodeId) -> SmolStr {
        match self.previous(member) {
            Some(object) => self.type_name(&self.value_type(object)),
            None => SmolStr::new_static("unknown"),
        }
    }

    /// Whether any node under `root` is still a placeholder.
    pub fn has_unresolved(&self, root: NodeId) -> bool {
        self.statement_nodes(root)
            .into_iter()
            .any(|node| matches!(self.kind(node), NodeKind::Unresolved { .. }))
    }

    /// Scope of the declared type of the object a member is read from.
    fn member_scope(&self, member: NodeId) -> Option<ContextId> {
        let object = self.previous(member)?;
        match self.value_type(object) {
            TypeRef::Declared(ty) => self.context_of(ty),
            _ => None,
        }
    }

    /// Give an implicitly declared variable the type of the value assigned
    /// to it, once that type is known.
    fn infer(&mut self, node: NodeId) -> bool {
        if !matches!(self.kind(node), NodeKind::Operator(Operator::Assign)) {
            return false;
        }
        let (Some(target), Some(value)) = (self.first(node), self.last(node)) else {
            return false;
        };
        let NodeKind::Variable { name, context } = self.kind(target) else {
            return false;
        };
        let (name, context) = (name.clone(), *context);

        let ty = self.value_type(value);
        if !ty.is_resolved() {
            return false;
        }

        match self.contexts[context.index()].variables.get_mut(&name) {
            Some(variable)
                if variable.ty == TypeRef::Unknown
                    && variable.category != VariableCategory::Parameter =>
            {
                variable.ty = ty;
                true
            }
            _ => false,
        }
    }

    /// `root` and its descendants in pre-order, without entering the
    /// types and functions below it.
    fn statement_nodes(&self, root: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            nodes.push(node);
            if node != root && matches!(self.kind(node), NodeKind::Type(_) | NodeKind::Function(_)) {
                continue;
            }
            let children: Vec<_> = self.children(node).collect();
            stack.extend(children.into_iter().rev());
        }

        nodes
    }

    /// Render a subtree as an indented outline, one node per line.
    pub fn dump(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, node, 0);
        out
    }

    fn dump_into(&self, out: &mut String, node: NodeId, depth: usize) {
        let _ = writeln!(out, "{:indent$}{}", "", self.kind(node).label(), indent = depth * 2);
        for child in self.children(node) {
            self.dump_into(out, child, depth + 1);
        }
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tree: &SyntaxTree, parent: NodeId) -> Vec<String> {
        tree.children(parent).map(|c| tree.kind(c).label()).collect()
    }

    fn number(tree: &mut SyntaxTree, value: i64) -> NodeId {
        tree.alloc(
            NodeKind::Number(crate::parser::token::NumberValue::Integer(value)),
            Span::default(),
        )
    }

    fn variable(name: &str, file: u32) -> Variable {
        Variable {
            name: SmolStr::new(name),
            ty: TypeRef::Unknown,
            category: VariableCategory::Global,
            span: Span::default(),
            file: FileId::new(file),
        }
    }

    #[test]
    fn test_add_insert_and_traverse() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let root = tree.alloc(NodeKind::Block, Span::default());
        let one = number(&mut tree, 1);
        let two = number(&mut tree, 2);
        let zero = number(&mut tree, 0);

        tree.add(root, one);
        tree.add(root, two);
        tree.insert(one, zero);

        assert_eq!(names(&tree, root), vec!["Number 0", "Number 1", "Number 2"]);
        assert_eq!(tree.first(root), Some(zero));
        assert_eq!(tree.last(root), Some(two));
        assert_eq!(tree.next(zero), Some(one));
        assert_eq!(tree.previous(two), Some(one));
        assert_eq!(tree.parent(zero), Some(root));
    }

    #[test]
    fn test_detach_middle_and_ends() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let root = tree.alloc(NodeKind::Block, Span::default());
        let nodes: Vec<_> = (0..3).map(|i| number(&mut tree, i)).collect();
        for &node in &nodes {
            tree.add(root, node);
        }

        tree.detach(nodes[1]);
        assert_eq!(names(&tree, root), vec!["Number 0", "Number 2"]);

        tree.detach(nodes[0]);
        tree.detach(nodes[2]);
        assert_eq!(tree.first(root), None);
        assert_eq!(tree.last(root), None);
        assert_eq!(tree.parent(nodes[2]), None);
    }

    #[test]
    fn test_merge_reparents_in_order() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let a = tree.alloc(NodeKind::Block, Span::default());
        let b = tree.alloc(NodeKind::Block, Span::default());
        let (one, two, three) = (number(&mut tree, 1), number(&mut tree, 2), number(&mut tree, 3));
        tree.add(a, one);
        tree.add(b, two);
        tree.add(b, three);

        tree.merge(a, b);

        assert_eq!(names(&tree, a), vec!["Number 1", "Number 2", "Number 3"]);
        assert_eq!(tree.child_count(b), 0);
        assert_eq!(tree.parent(three), Some(a));
    }

    #[test]
    fn test_link_only_once() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let outer = tree.new_context();
        let other = tree.new_context();
        let inner = tree.new_context();

        assert!(tree.link(inner, outer).is_ok());
        assert_eq!(tree.link(inner, other), Err(TreeError::AlreadyLinked(inner)));
        assert_eq!(tree.context(inner).parent(), Some(outer));
    }

    #[test]
    fn test_lookup_prefers_local_scope() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let outer = tree.new_context();
        let inner = tree.child_context(outer).unwrap();

        tree.declare_variable(outer, variable("x", 0)).unwrap();
        tree.declare_variable(outer, variable("y", 0)).unwrap();
        tree.declare_variable(inner, variable("x", 0)).unwrap();

        assert_eq!(tree.lookup_variable(inner, "x").map(|(c, _)| c), Some(inner));
        assert_eq!(tree.lookup_variable(inner, "y").map(|(c, _)| c), Some(outer));
        assert!(tree.lookup_variable(outer, "z").is_none());
    }

    #[test]
    fn test_duplicate_declaration_in_one_scope() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let context = tree.new_context();

        tree.declare_variable(context, variable("x", 0)).unwrap();
        let error = tree.declare_variable(context, variable("x", 0)).unwrap_err();

        assert!(matches!(error, ParseError::Duplicate { kind: "variable", .. }));
    }

    #[test]
    fn test_merge_context_first_wins_and_adopts_children() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let program = tree.new_context();
        let file = tree.new_context();
        let nested = tree.child_context(file).unwrap();

        tree.declare_variable(program, variable("x", 0)).unwrap();
        tree.declare_variable(file, variable("x", 1)).unwrap();
        tree.declare_variable(file, variable("y", 1)).unwrap();

        let conflicts = tree.merge_context(program, file);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].name, "x");
        assert_eq!(conflicts[0].file, FileId::new(1));
        assert_eq!(tree.context(program).local_variable("x").unwrap().file, FileId::new(0));
        assert!(tree.context(program).local_variable("y").is_some());
        assert_eq!(tree.context(nested).parent(), Some(program));
        assert!(tree.context(file).is_empty());
    }

    #[test]
    fn test_merge_tree_shifts_indices() {
        let mut program = SyntaxTree::new(FileId::new(0));
        let root = program.alloc(NodeKind::Block, Span::default());
        let context = program.new_context();
        let existing = number(&mut program, 7);
        program.add(root, existing);

        let mut file = SyntaxTree::new(FileId::new(1));
        let file_root = file.alloc(NodeKind::Block, Span::default());
        let file_context = file.new_context();
        let local = file.child_context(file_context).unwrap();
        let value = number(&mut file, 8);
        let reference = file.alloc(
            NodeKind::Variable { name: SmolStr::new("v"), context: local },
            Span::default(),
        );
        file.add(file_root, value);
        file.add(file_root, reference);

        let conflicts = program.merge_tree(root, context, file, file_root, file_context);
        assert!(conflicts.is_empty());

        let children: Vec<_> = program.children(root).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(program.node(children[1]).file, FileId::new(1));

        match program.kind(children[2]) {
            NodeKind::Variable { context: shifted, .. } => {
                assert_eq!(program.context(*shifted).parent(), Some(context));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_lookup_type_ref() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let outer = tree.new_context();
        let inner = tree.child_context(outer).unwrap();
        let body = crate::parser::lexer::tokenize("{}").unwrap().remove(0);
        let point = tree.alloc(
            NodeKind::Type(crate::syntax::TypeNode {
                name: SmolStr::new("Point"),
                status: crate::syntax::Status::Unparsed,
                body: body.content().unwrap().clone(),
            }),
            Span::default(),
        );
        tree.declare_type(outer, SmolStr::new("Point"), point, Position::default())
            .unwrap();

        assert_eq!(tree.lookup_type_ref(inner, "Point"), Some(TypeRef::Declared(point)));
        assert_eq!(tree.lookup_type_ref(inner, "u8"), Some(TypeRef::Primitive(Primitive::U8)));
        assert_eq!(tree.lookup_type_ref(inner, "Line"), None);
        assert_eq!(tree.type_name(&TypeRef::Declared(point)), "Point");
    }

    #[test]
    fn test_dump_outline() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let root = tree.alloc(NodeKind::Block, Span::default());
        let ret = tree.alloc(NodeKind::Return, Span::default());
        let one = number(&mut tree, 1);
        tree.add(root, ret);
        tree.add(ret, one);

        assert_eq!(tree.dump(root), "Block\n  Return\n    Number 1\n");
    }

    #[test]
    fn test_child_context_cannot_be_relinked() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let outer = tree.new_context();
        let other = tree.new_context();
        let inner = tree.child_context(outer).unwrap();

        assert_eq!(tree.context(inner).parent(), Some(outer));
        assert_eq!(tree.link(inner, other), Err(TreeError::AlreadyLinked(inner)));
    }

    #[test]
    fn test_merge_tree_retargets_file_scope_references() {
        let mut program = SyntaxTree::new(FileId::new(0));
        let root = program.alloc(NodeKind::Block, Span::default());
        let context = program.new_context();

        let mut file = SyntaxTree::new(FileId::new(1));
        let file_root = file.alloc(NodeKind::Block, Span::default());
        let file_context = file.new_context();
        let mut x = variable("x", 1);
        x.ty = TypeRef::Primitive(Primitive::I64);
        file.declare_variable(file_context, x).unwrap();
        let reference = file.alloc(
            NodeKind::Variable { name: SmolStr::new("x"), context: file_context },
            Span::default(),
        );
        file.add(file_root, reference);

        program.merge_tree(root, context, file, file_root, file_context);

        let reference = program.first(root).unwrap();
        assert_eq!(
            program.kind(reference),
            &NodeKind::Variable { name: SmolStr::new("x"), context }
        );
        assert_eq!(program.value_type(reference), TypeRef::Primitive(Primitive::I64));
    }

    #[test]
    fn test_settle_binds_names_declared_later() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let context = tree.new_context();
        let root = tree.alloc(NodeKind::Block, Span::default());

        // y = x, before x = 1 exists
        let assign = tree.alloc(NodeKind::Operator(Operator::Assign), Span::default());
        let y = tree.alloc(
            NodeKind::Variable { name: SmolStr::new("y"), context },
            Span::default(),
        );
        let x = tree.alloc(
            NodeKind::Unresolved { name: SmolStr::new("x"), context, role: NameRole::Value },
            Span::default(),
        );
        tree.add(root, assign);
        tree.add(assign, y);
        tree.add(assign, x);
        tree.declare_variable(context, variable("y", 0)).unwrap();

        assert_eq!(tree.settle(root), vec![x]);
        assert!(tree.has_unresolved(root));

        let mut declared = variable("x", 0);
        declared.ty = TypeRef::Primitive(Primitive::Decimal);
        tree.declare_variable(context, declared).unwrap();

        assert!(tree.settle(root).is_empty());
        assert_eq!(tree.kind(x), &NodeKind::Variable { name: SmolStr::new("x"), context });
        assert_eq!(
            tree.context(context).local_variable("y").unwrap().ty,
            TypeRef::Primitive(Primitive::Decimal)
        );
    }

    #[test]
    fn test_unbound_call_names_its_role() {
        let mut tree = SyntaxTree::new(FileId::new(0));
        let context = tree.new_context();
        let call = tree.alloc(
            NodeKind::Unresolved { name: SmolStr::new("make"), context, role: NameRole::Call },
            Span::default(),
        );
        let argument = number(&mut tree, 1);
        tree.add(call, argument);

        assert!(!tree.bind(call));
        assert_eq!(tree.dump(call), "Unresolved make\n  Number 1\n");
    }
}
