//! Name resolution: filling in deferred declarations across the program.
//!
//! File parsing only records types and functions; their bodies are kept as
//! raw content. Once every file is merged into one tree the [`Resolver`]
//! walks it in fixed order:
//!
//! 0. **Globals** - variables declared at file level get their type names
//!    resolved, now that every file's types are visible.
//! 1. **Types** - every type body is parsed under the type's scope and its
//!    member types are resolved, depth first.
//! 2. **Signatures** - parameter and return types of every function
//!    outside a function body.
//! 3. **Statements** - names used by file level statements are bound
//!    against the whole program.
//! 4. **Bodies** - every function body is parsed against the results of
//!    the passes before. Types and functions nested in a body are resolved
//!    right after it.
//!
//! A name that no pass could bind is reported as unresolved, and the
//! declaration it appears in fails.
//!
//! Each declaration moves `Unparsed → Parsing → Resolved` or `→ Failed`.
//! Failures are recorded and the walk continues, so one bad declaration
//! never hides the errors of another.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, warn};

use super::diagnostics::codes;
use crate::base::{FileId, Position};
use crate::parser::engine::{Parser, PatternSet};
use crate::parser::result::ParseError;
use crate::syntax::{
    ContextId, MergeConflict, NameRole, NodeId, NodeKind, Status, SyntaxTree, TypeRef, Variable,
    VariableCategory,
};

// ============================================================================
// ERRORS
// ============================================================================

/// A failure recorded while resolving the program.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ResolveError {
    #[error("{position} | unresolved type '{name}'")]
    UnresolvedType {
        name: SmolStr,
        file: FileId,
        position: Position,
    },

    #[error("{position} | unresolved name '{name}'")]
    UnresolvedName {
        name: SmolStr,
        file: FileId,
        position: Position,
    },

    #[error("{position} | {kind} '{name}' is already declared")]
    DuplicateDeclaration {
        kind: &'static str,
        name: SmolStr,
        file: FileId,
        position: Position,
    },

    /// Any other failure while parsing a declaration body.
    #[error("{source} (in '{declaration}')")]
    Body {
        declaration: SmolStr,
        file: FileId,
        source: ParseError,
    },
}

impl ResolveError {
    /// Attribute a body parse failure of `declaration` to the right kind.
    pub fn from_parse(declaration: &SmolStr, file: FileId, error: ParseError) -> Self {
        match error {
            ParseError::UnknownMember { name, owner, position } => ResolveError::UnresolvedName {
                name: SmolStr::new(format!("{}.{}", owner, name)),
                file,
                position,
            },
            ParseError::UnresolvedType { name, position } => {
                ResolveError::UnresolvedType { name, file, position }
            }
            ParseError::Duplicate { kind, name, position } => {
                ResolveError::DuplicateDeclaration { kind, name, file, position }
            }
            source => ResolveError::Body {
                declaration: declaration.clone(),
                file,
                source,
            },
        }
    }

    pub fn file(&self) -> FileId {
        match self {
            ResolveError::UnresolvedType { file, .. }
            | ResolveError::UnresolvedName { file, .. }
            | ResolveError::DuplicateDeclaration { file, .. }
            | ResolveError::Body { file, .. } => *file,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ResolveError::UnresolvedType { position, .. }
            | ResolveError::UnresolvedName { position, .. }
            | ResolveError::DuplicateDeclaration { position, .. } => *position,
            ResolveError::Body { source, .. } => source.position(),
        }
    }

    /// Diagnostic code of this error.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UnresolvedType { .. } => codes::UNRESOLVED_TYPE,
            ResolveError::UnresolvedName { .. } => codes::UNRESOLVED_NAME,
            ResolveError::DuplicateDeclaration { .. } => codes::DUPLICATE_DECLARATION,
            ResolveError::Body { .. } => codes::INVALID_BODY,
        }
    }
}

impl From<MergeConflict> for ResolveError {
    fn from(conflict: MergeConflict) -> Self {
        ResolveError::DuplicateDeclaration {
            kind: conflict.kind,
            name: conflict.name,
            file: conflict.file,
            position: conflict.span.start,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves the deferred declarations of a merged program tree.
pub struct Resolver<'a> {
    tree: &'a mut SyntaxTree,
    patterns: &'a PatternSet,
    errors: Vec<ResolveError>,
    /// Functions whose signature pass ran
    signed: FxHashSet<NodeId>,
    /// Functions with a parameter or return type that did not resolve
    broken: FxHashSet<NodeId>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver using the standard patterns.
    pub fn new(tree: &'a mut SyntaxTree) -> Self {
        Self::with_patterns(tree, PatternSet::standard())
    }

    pub fn with_patterns(tree: &'a mut SyntaxTree, patterns: &'a PatternSet) -> Self {
        Self {
            tree,
            patterns,
            errors: Vec::new(),
            signed: FxHashSet::default(),
            broken: FxHashSet::default(),
        }
    }

    /// Run every pass over the tree under `root`.
    ///
    /// Returns every recorded error; an empty list means the whole program
    /// resolved.
    pub fn resolve(mut self, root: NodeId) -> Vec<ResolveError> {
        self.resolve_globals();
        self.walk_types(root);
        self.walk_signatures(root);

        let unbound = self.tree.settle(root);
        self.report_unbound(unbound);

        self.walk_functions(root);
        self.errors
    }

    fn record(&mut self, error: ResolveError) {
        warn!(code = error.code(), "{}", error);
        self.errors.push(error);
    }

    /// Record the placeholders left after settling. Returns whether there
    /// were none.
    ///
    /// A member of an object that is itself unbound is not reported again.
    fn report_unbound(&mut self, unbound: Vec<NodeId>) -> bool {
        let clean = unbound.is_empty();

        for node in unbound {
            let NodeKind::Unresolved { name, role, .. } = self.tree.kind(node) else {
                continue;
            };
            let name = match role {
                NameRole::Value | NameRole::Call => name.clone(),
                NameRole::Member | NameRole::Method => {
                    let object = self.tree.previous(node);
                    if object.is_some_and(|object| self.tree.has_unresolved(object)) {
                        continue;
                    }
                    SmolStr::new(format!("{}.{}", self.tree.member_owner(node), name))
                }
            };

            let file = self.tree.node(node).file;
            let position = self.tree.span(node).start;
            self.record(ResolveError::UnresolvedName { name, file, position });
        }

        clean
    }

    // ------------------------------------------------------------------------
    // Pass 0: globals
    // ------------------------------------------------------------------------

    fn resolve_globals(&mut self) {
        let contexts: Vec<_> = self.tree.context_ids().collect();

        for context in contexts {
            let pending: Vec<_> = self
                .tree
                .context(context)
                .variables()
                .filter_map(|variable| match &variable.ty {
                    TypeRef::Unresolved(name) => Some((variable.name.clone(), name.clone())),
                    _ => None,
                })
                .collect();

            for (variable, ty) in pending {
                self.resolve_variable_type(context, &variable, &ty);
            }
        }
    }

    /// Resolve the type name of a declared variable in place.
    ///
    /// Returns whether it resolved.
    fn resolve_variable_type(&mut self, context: ContextId, variable: &str, ty: &SmolStr) -> bool {
        let resolved = self.tree.lookup_type_ref(context, ty);
        let Some(entry) = self.tree.context_mut(context).variables.get_mut(variable) else {
            return false;
        };

        match resolved {
            Some(resolved) => {
                entry.ty = resolved;
                true
            }
            None => {
                let error = ResolveError::UnresolvedType {
                    name: ty.clone(),
                    file: entry.file,
                    position: entry.span.start,
                };
                self.record(error);
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Pass 1: types
    // ------------------------------------------------------------------------

    fn walk_types(&mut self, node: NodeId) {
        if matches!(self.tree.kind(node), NodeKind::Type(_)) {
            self.resolve_type(node);
        }

        let children: Vec<_> = self.tree.children(node).collect();
        for child in children {
            self.walk_types(child);
        }
    }

    fn resolve_type(&mut self, node: NodeId) {
        let NodeKind::Type(ty) = self.tree.kind(node) else {
            return;
        };
        if ty.status != Status::Unparsed {
            return;
        }

        let name = ty.name.clone();
        let body = ty.body.clone();
        let Some(scope) = self.tree.context_of(node) else {
            return;
        };

        self.set_status(node, Status::Parsing);
        let file = self.tree.node(node).file;
        self.tree.set_file(file);

        let parsed = Parser::new(self.patterns, self.tree, VariableCategory::Member)
            .parse_content(scope, &body);
        let block = match parsed {
            Ok(block) => block,
            Err(error) => {
                self.record(ResolveError::from_parse(&name, file, error));
                self.set_status(node, Status::Failed);
                return;
            }
        };
        self.tree.merge(node, block);

        let unbound = self.tree.settle(node);
        let mut resolved = self.report_unbound(unbound);

        let members: Vec<_> = self
            .tree
            .context(scope)
            .variables()
            .filter_map(|member| match &member.ty {
                TypeRef::Unresolved(ty) => Some((member.name.clone(), ty.clone())),
                _ => None,
            })
            .collect();

        for (member, ty) in members {
            resolved &= self.resolve_variable_type(scope, &member, &ty);
        }

        let status = if resolved { Status::Resolved } else { Status::Failed };
        debug!(name = %name, ?status, "resolved type");
        self.set_status(node, status);
    }

    // ------------------------------------------------------------------------
    // Pass 2: signatures
    // ------------------------------------------------------------------------

    fn walk_signatures(&mut self, node: NodeId) {
        if matches!(self.tree.kind(node), NodeKind::Function(_)) {
            self.sign_function(node);
            return;
        }

        let children: Vec<_> = self.tree.children(node).collect();
        for child in children {
            self.walk_signatures(child);
        }
    }

    /// Resolve parameter and return types and declare the parameters.
    fn sign_function(&mut self, node: NodeId) {
        if !self.signed.insert(node) {
            return;
        }
        let NodeKind::Function(function) = self.tree.kind(node) else {
            return;
        };

        let name = function.name.clone();
        let mut parameters = function.parameters.clone();
        let mut return_type = function.return_type.clone();
        let Some(scope) = self.tree.context_of(node) else {
            return;
        };
        let file = self.tree.node(node).file;

        let mut resolved = true;

        for parameter in &mut parameters {
            resolved &= self.resolve_signature_type(scope, file, &mut parameter.ty, parameter.span.start);

            let declared = self.tree.declare_variable(
                scope,
                Variable {
                    name: parameter.name.clone(),
                    ty: parameter.ty.clone(),
                    category: VariableCategory::Parameter,
                    span: parameter.span,
                    file,
                },
            );
            if let Err(error) = declared {
                self.record(ResolveError::from_parse(&name, file, error));
                resolved = false;
            }
        }

        let position = self.tree.span(node).start;
        resolved &= self.resolve_signature_type(scope, file, &mut return_type, position);

        if let NodeKind::Function(function) = self.tree.kind_mut(node) {
            function.parameters = parameters;
            function.return_type = return_type;
        }
        if !resolved {
            self.broken.insert(node);
        }
    }

    // ------------------------------------------------------------------------
    // Pass 4: bodies
    // ------------------------------------------------------------------------

    fn walk_functions(&mut self, node: NodeId) {
        if matches!(self.tree.kind(node), NodeKind::Function(_)) {
            self.resolve_function(node);
        }

        let children: Vec<_> = self.tree.children(node).collect();
        for child in children {
            self.walk_functions(child);
        }
    }

    fn resolve_function(&mut self, node: NodeId) {
        self.sign_function(node);

        let NodeKind::Function(function) = self.tree.kind(node) else {
            return;
        };
        if function.status != Status::Unparsed {
            return;
        }

        let name = function.name.clone();
        let body = function.body.clone();
        let Some(scope) = self.tree.context_of(node) else {
            return;
        };

        self.set_status(node, Status::Parsing);
        let file = self.tree.node(node).file;
        self.tree.set_file(file);

        let parsed = Parser::new(self.patterns, self.tree, VariableCategory::Local)
            .parse_content(scope, &body);
        match parsed {
            Ok(block) => self.tree.merge(node, block),
            Err(error) => {
                self.record(ResolveError::from_parse(&name, file, error));
                self.set_status(node, Status::Failed);
                return;
            }
        }

        // Types and signatures declared inside the body
        let children: Vec<_> = self.tree.children(node).collect();
        for &child in &children {
            self.walk_types(child);
        }
        for &child in &children {
            self.walk_signatures(child);
        }

        let unbound = self.tree.settle(node);
        let resolved = self.report_unbound(unbound) && !self.broken.contains(&node);

        let status = if resolved { Status::Resolved } else { Status::Failed };
        debug!(name = %name, ?status, "resolved function");
        self.set_status(node, status);
    }

    /// Resolve a parameter or return type in place.
    fn resolve_signature_type(
        &mut self,
        scope: ContextId,
        file: FileId,
        ty: &mut TypeRef,
        position: Position,
    ) -> bool {
        let TypeRef::Unresolved(name) = &*ty else {
            return true;
        };
        let name = name.clone();

        match self.tree.lookup_type_ref(scope, &name) {
            Some(resolved) => {
                *ty = resolved;
                true
            }
            None => {
                let error = ResolveError::UnresolvedType {
                    name,
                    file,
                    position,
                };
                self.record(error);
                false
            }
        }
    }

    fn set_status(&mut self, node: NodeId, status: Status) {
        match self.tree.kind_mut(node) {
            NodeKind::Type(ty) => ty.status = status,
            NodeKind::Function(function) => function.status = status,
            _ => {}
        }
    }
}
