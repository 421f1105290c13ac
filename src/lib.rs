//! # weave
//!
//! Front end for the Weave language: lexing, pattern-driven parsing and
//! name resolution over a merged multi-file program.
//!
//! ## Module Structure
//!
//! - `base` - FileId, Position, Span
//! - `parser` - Lexer, pattern engine, standard patterns
//! - `syntax` - Node/context arena the patterns build into
//! - `hir` - Primitive types, diagnostics, resolver
//! - `project` - Input files, loader, parallel pipeline
//!
//! A run goes `project` → `parser` → `syntax` → `hir`; see
//! [`project::Pipeline`].

/// Foundation types: FileId, Position, Span
pub mod base;

/// Primitive types, diagnostics and the resolver
pub mod hir;

/// Lexer and pattern-driven parser
pub mod parser;

/// Input files and the compilation pipeline
pub mod project;

/// Syntax tree arena with scopes
pub mod syntax;

// Re-export commonly needed items
pub use parser::keywords;

pub use base::{FileId, Position, Span, TextSize};
pub use hir::{Diagnostic, ResolveError};
pub use project::{Compilation, CompilerConfig, FileSet, Pipeline, Stage};
pub use syntax::SyntaxTree;
