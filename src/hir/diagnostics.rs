//! Diagnostics: error reporting for every compiler stage.
//!
//! Stages produce typed errors; this module turns them into positioned,
//! coded [`Diagnostic`]s and collects them. [`DiagnosticCollector`] is the
//! single-threaded sink used by the resolver, [`ErrorSink`] the shared one
//! that parallel pipeline tasks append to.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::resolve::ResolveError;
use crate::base::{FileId, Position, Span};
use crate::parser::result::{LexError, ParseError};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// The file containing this diagnostic.
    pub file: FileId,
    pub start: Position,
    pub end: Position,
    /// Stable code of the failure (e.g., "E0300").
    pub code: Option<&'static str>,
    /// The diagnostic message, prefixed with its `line:column`.
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(file: FileId, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            start: span.start,
            end: span.end,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn from_lex(file: FileId, error: &LexError) -> Self {
        Self::error(file, Span::at(error.position()), error.to_string()).with_code(codes::LEX)
    }

    pub fn from_parse(file: FileId, error: &ParseError) -> Self {
        let code = match error {
            ParseError::Lex(_) => codes::LEX,
            _ => codes::PARSE,
        };
        Self::error(file, Span::at(error.position()), error.to_string()).with_code(code)
    }

    pub fn from_resolve(error: &ResolveError) -> Self {
        Self::error(error.file(), Span::at(error.position()), error.to_string())
            .with_code(error.code())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "ERROR[{}]: {}", code, self.message),
            None => write!(f, "ERROR: {}", self.message),
        }
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes, one range per stage.
pub mod codes {
    /// Source file could not be read.
    pub const LOAD: &str = "E0100";
    /// Source text could not be tokenized.
    pub const LEX: &str = "E0200";
    /// Tokens could not be reduced.
    pub const PARSE: &str = "E0300";
    /// Type name not found.
    pub const UNRESOLVED_TYPE: &str = "E0400";
    /// Variable, function or member not found.
    pub const UNRESOLVED_NAME: &str = "E0401";
    /// Name declared twice.
    pub const DUPLICATE_DECLARATION: &str = "E0402";
    /// Declaration body failed to parse.
    pub const INVALID_BODY: &str = "E0403";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics on one thread.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Every diagnostic is an error, so any entry fails the stage.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Order diagnostics by file, then by position.
    ///
    /// The sort is stable, so diagnostics at the same place keep the order
    /// in which they were reported.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by_key(|d| (d.file, d.start.absolute));
    }
}

// ============================================================================
// ERROR SINK
// ============================================================================

/// Diagnostic collector shared by concurrent tasks.
#[derive(Debug, Default)]
pub struct ErrorSink {
    inner: Mutex<DiagnosticCollector>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, diagnostic: Diagnostic) {
        self.inner.lock().add(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.inner.lock().has_errors()
    }

    /// Consume the sink, with diagnostics in file and position order.
    ///
    /// Tasks append in whatever order they finish; sorting makes the report
    /// independent of scheduling.
    pub fn into_sorted(self) -> DiagnosticCollector {
        let mut collector = self.inner.into_inner();
        collector.sort();
        collector
    }
}
