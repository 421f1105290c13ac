//! Program-level semantics: primitive types, diagnostics and resolution.
//!
//! - [`Primitive`] - Built-in scalar types, always in scope
//! - [`Diagnostic`], [`ErrorSink`] - Positioned, coded error reports
//! - [`Resolver`] - Passes over the merged program tree

mod diagnostics;
mod primitives;
mod resolve;

pub use diagnostics::{Diagnostic, DiagnosticCollector, ErrorSink, codes};
pub use primitives::{PRIMITIVES, Primitive, is_primitive_type};
pub use resolve::{ResolveError, Resolver};
