//! Keyword and operator catalogue.
//!
//! The lexer consults this table when promoting raw text areas into
//! concrete tokens: reserved words become [`Keyword`]s and punctuation
//! runs are split into [`Operator`]s.

use std::fmt;

/// Reserved words of the language.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Type,
    Func,
    While,
    If,
    Else,
    Return,
}

/// All reserved words, in declaration order.
pub const KEYWORDS: &[Keyword] = &[
    Keyword::Type,
    Keyword::Func,
    Keyword::While,
    Keyword::If,
    Keyword::Else,
    Keyword::Return,
];

impl Keyword {
    /// The source spelling of the keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::Type => "type",
            Keyword::Func => "func",
            Keyword::While => "while",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Return => "return",
        }
    }

    /// Look up a keyword by its spelling.
    pub fn from_text(text: &str) -> Option<Keyword> {
        KEYWORDS.iter().copied().find(|k| k.as_str() == text)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether `text` is a reserved word.
pub fn is_keyword(text: &str) -> bool {
    Keyword::from_text(text).is_some()
}

/// Operator symbols.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    Equals,
    NotEquals,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    And,
    Or,
    Dot,
    Comma,
    Colon,
}

/// All operators, longest symbols first so greedy splitting prefers them.
pub const OPERATORS: &[Operator] = &[
    Operator::AddAssign,
    Operator::SubtractAssign,
    Operator::MultiplyAssign,
    Operator::DivideAssign,
    Operator::Equals,
    Operator::NotEquals,
    Operator::LessOrEqual,
    Operator::GreaterOrEqual,
    Operator::And,
    Operator::Or,
    Operator::Add,
    Operator::Subtract,
    Operator::Multiply,
    Operator::Divide,
    Operator::Remainder,
    Operator::Assign,
    Operator::Less,
    Operator::Greater,
    Operator::Dot,
    Operator::Comma,
    Operator::Colon,
];

impl Operator {
    /// The source spelling of the operator.
    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Remainder => "%",
            Operator::Assign => "=",
            Operator::AddAssign => "+=",
            Operator::SubtractAssign => "-=",
            Operator::MultiplyAssign => "*=",
            Operator::DivideAssign => "/=",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Dot => ".",
            Operator::Comma => ",",
            Operator::Colon => ":",
        }
    }

    /// Look up an operator by its exact spelling.
    pub fn from_symbol(text: &str) -> Option<Operator> {
        OPERATORS.iter().copied().find(|o| o.symbol() == text)
    }

    /// Binding strength of a binary operator, or `None` for separators.
    ///
    /// Doubles as the priority of the binary operator pattern.
    pub const fn precedence(self) -> Option<u32> {
        match self {
            Operator::Multiply | Operator::Divide | Operator::Remainder => Some(12),
            Operator::Add | Operator::Subtract => Some(11),
            Operator::Less
            | Operator::Greater
            | Operator::LessOrEqual
            | Operator::GreaterOrEqual => Some(9),
            Operator::Equals | Operator::NotEquals => Some(8),
            Operator::And => Some(7),
            Operator::Or => Some(6),
            Operator::Assign
            | Operator::AddAssign
            | Operator::SubtractAssign
            | Operator::MultiplyAssign
            | Operator::DivideAssign => Some(3),
            Operator::Dot | Operator::Comma | Operator::Colon => None,
        }
    }

    pub const fn is_binary(self) -> bool {
        self.precedence().is_some()
    }

    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            Operator::Assign
                | Operator::AddAssign
                | Operator::SubtractAssign
                | Operator::MultiplyAssign
                | Operator::DivideAssign
        )
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Less
                | Operator::Greater
                | Operator::LessOrEqual
                | Operator::GreaterOrEqual
                | Operator::Equals
                | Operator::NotEquals
                | Operator::And
                | Operator::Or
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Check whether `text` is exactly one operator symbol.
pub fn is_operator_symbol(text: &str) -> bool {
    Operator::from_symbol(text).is_some()
}

/// Split a run of operator characters into symbols, longest match first.
///
/// Returns the symbols with their byte offsets inside `text`, or the offset
/// of the first character no symbol starts with.
pub fn split_operators(text: &str) -> Result<Vec<(usize, Operator)>, usize> {
    let mut result = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let Some(operator) = OPERATORS.iter().copied().find(|o| rest.starts_with(o.symbol()))
        else {
            return Err(offset);
        };

        result.push((offset, operator));
        offset += operator.symbol().len();
    }

    Ok(result)
}
