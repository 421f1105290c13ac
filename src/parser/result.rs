//! Error types produced while lexing and parsing.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::Position;
use crate::syntax::TreeError;

/// Failure to turn source text into tokens.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{position} | unmatched parenthesis")]
    UnmatchedParenthesis { position: Position },

    #[error("{position} | missing operator between number and parenthesis")]
    MissingOperator { position: Position },

    #[error("{position} | unrecognized character '{ch}'")]
    UnrecognizedCharacter { ch: char, position: Position },

    #[error("{position} | unrecognized operator '{text}'")]
    UnrecognizedOperator { text: SmolStr, position: Position },

    #[error("{position} | invalid number '{text}'")]
    InvalidNumber { text: SmolStr, position: Position },
}

impl LexError {
    /// Where the failure was detected.
    pub fn position(&self) -> Position {
        match self {
            LexError::UnmatchedParenthesis { position }
            | LexError::MissingOperator { position }
            | LexError::UnrecognizedCharacter { position, .. }
            | LexError::UnrecognizedOperator { position, .. }
            | LexError::InvalidNumber { position, .. } => *position,
        }
    }
}

/// Failure to reduce tokens into a syntax tree.
///
/// Structural non-matches never surface here: a pattern that does not fit a
/// window is simply skipped. These are leftovers nothing could reduce, and
/// semantic failures raised by a pattern's builder.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ParseError {
    /// Nested content failed to tokenize during descent.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A scope was linked twice.
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("{position} | unexpected '{text}'")]
    NoMatch { text: SmolStr, position: Position },

    #[error("{position} | while parenthesis cannot be empty")]
    EmptyWhileHeader { position: Position },

    #[error("{position} | if condition must be a single expression, found {count}")]
    InvalidCondition { count: usize, position: Position },

    #[error("{position} | {kind} '{name}' is already declared in this scope")]
    Duplicate {
        kind: &'static str,
        name: SmolStr,
        position: Position,
    },

    #[error("{position} | unresolved type '{name}'")]
    UnresolvedType { name: SmolStr, position: Position },

    #[error("{position} | no member '{name}' on a value of type '{owner}'")]
    UnknownMember {
        name: SmolStr,
        owner: SmolStr,
        position: Position,
    },

    #[error("{position} | expected {expected}")]
    Expected {
        expected: &'static str,
        position: Position,
    },
}

impl ParseError {
    /// Where the failure was detected.
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(error) => error.position(),
            ParseError::Tree(_) => Position::default(),
            ParseError::NoMatch { position, .. }
            | ParseError::EmptyWhileHeader { position }
            | ParseError::InvalidCondition { position, .. }
            | ParseError::Duplicate { position, .. }
            | ParseError::UnresolvedType { position, .. }
            | ParseError::UnknownMember { position, .. }
            | ParseError::Expected { position, .. } => *position,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextSize;

    #[test]
    fn test_messages_carry_position() {
        let position = Position::new(2, 6, TextSize::from(30));

        let error = ParseError::EmptyWhileHeader { position };
        assert_eq!(error.to_string(), "3:7 | while parenthesis cannot be empty");

        let error = LexError::MissingOperator { position };
        assert_eq!(
            error.to_string(),
            "3:7 | missing operator between number and parenthesis"
        );
    }

    #[test]
    fn test_lex_error_converts_transparently() {
        let position = Position::default();
        let error: ParseError = LexError::UnmatchedParenthesis { position }.into();

        assert_eq!(error.to_string(), "1:1 | unmatched parenthesis");
        assert_eq!(error.position(), position);
    }
}
