//! Token model shared by the lexer and the pattern engine.
//!
//! A [`Token`] is a closed variant over the token kinds the lexer produces
//! plus the two kinds synthesized later: function calls (folded by the
//! lexer) and dynamic subtrees (produced by the pattern engine whenever a
//! window of tokens is reduced into a node).

use std::borrow::Cow;
use std::fmt;
use std::ops::BitOr;

use smol_str::SmolStr;

use super::keywords::{Keyword, Operator};
use super::lexer;
use super::result::LexError;
use crate::base::{Position, Span};
use crate::syntax::NodeId;

// ============================================================================
// TYPE MASKS
// ============================================================================

/// Bitmask over token kinds, used by pattern slots.
///
/// Every token has exactly one kind bit. Slots combine several kind bits
/// with the `OPTIONAL` and `END` modifiers.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TokenType(u32);

impl TokenType {
    pub const NONE: TokenType = TokenType(0);
    pub const IDENTIFIER: TokenType = TokenType(1);
    pub const NUMBER: TokenType = TokenType(1 << 1);
    pub const OPERATOR: TokenType = TokenType(1 << 2);
    pub const KEYWORD: TokenType = TokenType(1 << 3);
    pub const CONTENT: TokenType = TokenType(1 << 4);
    pub const FUNCTION: TokenType = TokenType(1 << 5);
    pub const DYNAMIC: TokenType = TokenType(1 << 6);

    /// Zero-width slot: the next token starts a new line, or the window is at the end.
    pub const END: TokenType = TokenType(1 << 7);
    /// The slot may match nothing.
    pub const OPTIONAL: TokenType = TokenType(1 << 8);

    /// Anything that can stand as an operand.
    pub const OBJECT: TokenType = TokenType(
        Self::IDENTIFIER.0 | Self::NUMBER.0 | Self::FUNCTION.0 | Self::DYNAMIC.0,
    );

    const KINDS: u32 = (1 << 7) - 1;

    #[inline]
    pub const fn union(self, other: TokenType) -> TokenType {
        TokenType(self.0 | other.0)
    }

    /// Check whether every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: TokenType) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether `self` and `other` share a kind bit.
    #[inline]
    pub const fn intersects(self, other: TokenType) -> bool {
        self.0 & other.0 & Self::KINDS != 0
    }

    /// The kind bits without modifiers.
    #[inline]
    pub const fn kinds(self) -> TokenType {
        TokenType(self.0 & Self::KINDS)
    }

    #[inline]
    pub const fn is_optional(self) -> bool {
        self.contains(Self::OPTIONAL)
    }

    #[inline]
    pub const fn is_end(self) -> bool {
        self.contains(Self::END)
    }
}

impl BitOr for TokenType {
    type Output = TokenType;

    fn bitor(self, rhs: TokenType) -> TokenType {
        self.union(rhs)
    }
}

impl fmt::Debug for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(TokenType, &str)] = &[
            (TokenType::IDENTIFIER, "IDENTIFIER"),
            (TokenType::NUMBER, "NUMBER"),
            (TokenType::OPERATOR, "OPERATOR"),
            (TokenType::KEYWORD, "KEYWORD"),
            (TokenType::CONTENT, "CONTENT"),
            (TokenType::FUNCTION, "FUNCTION"),
            (TokenType::DYNAMIC, "DYNAMIC"),
            (TokenType::END, "END"),
            (TokenType::OPTIONAL, "OPTIONAL"),
        ];

        let names: Vec<_> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();

        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}

/// Classification bits fixed when a token is created.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct TokenFlags(u8);

impl TokenFlags {
    pub const NONE: TokenFlags = TokenFlags(0);
    /// A newline precedes the token, or it is the first of its sequence.
    pub const LINE_START: TokenFlags = TokenFlags(1);
    /// The token can be used as an expression operand.
    pub const VALUE: TokenFlags = TokenFlags(1 << 1);
    /// A dynamic token wrapping a parenthesized group.
    pub const GROUP: TokenFlags = TokenFlags(1 << 2);

    #[inline]
    pub const fn contains(self, other: TokenFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn with(self, other: TokenFlags) -> TokenFlags {
        TokenFlags(self.0 | other.0)
    }

    #[inline]
    pub const fn without(self, other: TokenFlags) -> TokenFlags {
        TokenFlags(self.0 & !other.0)
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// The three bracket kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParenthesisKind {
    /// `( ... )`
    Parenthesis,
    /// `[ ... ]`
    Bracket,
    /// `{ ... }`
    Curly,
}

impl ParenthesisKind {
    pub fn from_opener(c: char) -> Option<ParenthesisKind> {
        match c {
            '(' => Some(ParenthesisKind::Parenthesis),
            '[' => Some(ParenthesisKind::Bracket),
            '{' => Some(ParenthesisKind::Curly),
            _ => None,
        }
    }

    pub const fn opener(self) -> char {
        match self {
            ParenthesisKind::Parenthesis => '(',
            ParenthesisKind::Bracket => '[',
            ParenthesisKind::Curly => '{',
        }
    }

    pub const fn closer(self) -> char {
        match self {
            ParenthesisKind::Parenthesis => ')',
            ParenthesisKind::Bracket => ']',
            ParenthesisKind::Curly => '}',
        }
    }
}

/// A balanced bracketed run whose inside is tokenized on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentToken {
    pub kind: ParenthesisKind,
    /// Raw text including both delimiters.
    pub text: SmolStr,
    pub span: Span,
}

impl ContentToken {
    /// The text between the delimiters.
    pub fn inner_text(&self) -> &str {
        let len = self.text.len();
        if len < 2 { "" } else { &self.text[1..len - 1] }
    }

    /// Position of the first character after the opener.
    pub fn inner_start(&self) -> Position {
        let mut position = self.span.start;
        position.next_character(self.kind.opener());
        position
    }

    /// Tokenize the inside of the brackets.
    ///
    /// Nested tokens carry absolute positions in the enclosing file.
    pub fn tokens(&self) -> Result<Vec<Token>, LexError> {
        lexer::tokenize_at(self.inner_text(), self.inner_start())
    }

    /// Whether there is nothing but whitespace between the delimiters.
    pub fn is_empty(&self) -> bool {
        self.inner_text().trim().is_empty()
    }
}

/// A `name(...)` pair folded by the lexer.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionToken {
    pub name: SmolStr,
    pub name_span: Span,
    pub parameters: ContentToken,
}

/// Value of a numeric literal.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NumberValue {
    Integer(i64),
    Decimal(f64),
}

impl NumberValue {
    pub fn negated(self) -> NumberValue {
        match self {
            NumberValue::Integer(value) => NumberValue::Integer(value.wrapping_neg()),
            NumberValue::Decimal(value) => NumberValue::Decimal(-value),
        }
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberValue::Integer(value) => write!(f, "{}", value),
            NumberValue::Decimal(value) => write!(f, "{:?}", value),
        }
    }
}

// ============================================================================
// TOKEN
// ============================================================================

/// Payload of a token, discriminated by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(SmolStr),
    Number { text: SmolStr, value: NumberValue },
    Operator(Operator),
    Keyword(Keyword),
    Content(ContentToken),
    Function(FunctionToken),
    /// A region already reduced into a node.
    Dynamic(NodeId),
}

/// A classified, positioned unit of source text.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub flags: TokenFlags,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, flags: TokenFlags) -> Self {
        Self { kind, span, flags }
    }

    /// The single kind bit of this token.
    pub fn token_type(&self) -> TokenType {
        match self.kind {
            TokenKind::Identifier(_) => TokenType::IDENTIFIER,
            TokenKind::Number { .. } => TokenType::NUMBER,
            TokenKind::Operator(_) => TokenType::OPERATOR,
            TokenKind::Keyword(_) => TokenType::KEYWORD,
            TokenKind::Content(_) => TokenType::CONTENT,
            TokenKind::Function(_) => TokenType::FUNCTION,
            TokenKind::Dynamic(_) => TokenType::DYNAMIC,
        }
    }

    /// The source text the token was made from.
    ///
    /// Dynamic tokens have no text of their own.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.kind {
            TokenKind::Identifier(name) => Cow::Borrowed(name.as_str()),
            TokenKind::Number { text, .. } => Cow::Borrowed(text.as_str()),
            TokenKind::Operator(operator) => Cow::Borrowed(operator.symbol()),
            TokenKind::Keyword(keyword) => Cow::Borrowed(keyword.as_str()),
            TokenKind::Content(content) => Cow::Borrowed(content.text.as_str()),
            TokenKind::Function(function) => {
                Cow::Owned(format!("{}{}", function.name, function.parameters.text))
            }
            TokenKind::Dynamic(_) => Cow::Borrowed(""),
        }
    }

    #[inline]
    pub fn starts_line(&self) -> bool {
        self.flags.contains(TokenFlags::LINE_START)
    }

    #[inline]
    pub fn is_value(&self) -> bool {
        self.flags.contains(TokenFlags::VALUE)
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        self.flags.contains(TokenFlags::GROUP)
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(keyword) => Some(keyword),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            TokenKind::Operator(operator) => Some(operator),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&SmolStr> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&ContentToken> {
        match &self.kind {
            TokenKind::Content(content) => Some(content),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&FunctionToken> {
        match &self.kind {
            TokenKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn dynamic(&self) -> Option<NodeId> {
        match self.kind {
            TokenKind::Dynamic(node) => Some(node),
            _ => None,
        }
    }

    /// Whether this is bracketed content of the given kind.
    pub fn is_content_of(&self, kind: ParenthesisKind) -> bool {
        self.content().is_some_and(|c| c.kind == kind)
    }
}
