//! Lexing and pattern-driven parsing.
//!
//! Source text is cut into [`Token`]s by [`lexer::tokenize`], which also
//! folds bracketed regions into content tokens. The [`Parser`] then reduces
//! a token sequence by repeatedly building the best [`Pattern`] match until
//! only statements are left.

pub mod engine;
pub mod keywords;
pub mod lexer;
pub mod pattern;
pub mod patterns;
pub mod result;
pub mod token;

pub use engine::{Parser, PatternSet};
pub use lexer::{tokenize, tokenize_at};
pub use pattern::{Pattern, Window};
pub use result::{LexError, LexResult, ParseError, ParseResult};
pub use token::{Token, TokenFlags, TokenKind, TokenType};
