//! Foundation types for the Weave front end.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`FileId`] - Input file numbering
//! - [`Position`], [`Span`] - Source positions tracked by the lexer
//! - [`TextSize`] - Byte offsets
//!
//! This module has NO dependencies on other weave modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{Position, Span, TextSize};

// Re-export text-size types for convenience
pub use text_size;
