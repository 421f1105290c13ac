//! Lexer: source text → token sequence.
//!
//! Raw character areas are recognized by a `logos` automaton built from the
//! fixed character classes (text, number, operator, content delimiters).
//! Each area is then promoted to a concrete [`Token`], bracketed content is
//! captured whole without descending into it, and a final right-to-left pass
//! folds `name(...)` pairs into function-call tokens.

use logos::Logos;
use smol_str::SmolStr;

use super::keywords::{Keyword, Operator, split_operators};
use super::result::{LexError, LexResult};
use super::token::{ContentToken, FunctionToken, NumberValue, ParenthesisKind, Token, TokenFlags, TokenKind};
use crate::base::{Position, Span};

/// Raw character areas. Whitespace, newlines included, separates areas.
#[derive(Logos, Copy, Clone, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Area {
    /// Letters and underscore, then digits allowed
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Text,

    /// Digits, with decimal points allowed after the first
    #[regex(r"[0-9][0-9.]*")]
    Number,

    /// Punctuation run, split into symbols afterwards
    #[regex(r"[!-'*-/:-?^|~]+")]
    Operator,

    #[token("(")]
    #[token("[")]
    #[token("{")]
    Opener,

    #[token(")")]
    #[token("]")]
    #[token("}")]
    Closer,
}

/// Tokenize a whole file.
pub fn tokenize(text: &str) -> LexResult<Vec<Token>> {
    tokenize_at(text, Position::default())
}

/// Tokenize `text`, which starts at `origin` in its file.
///
/// Used for the lazy descent into bracketed content, so that nested tokens
/// report positions in the enclosing file.
pub fn tokenize_at(text: &str, origin: Position) -> LexResult<Vec<Token>> {
    let mut tokens = Lexer::new(text, origin).run()?;
    fold_functions(&mut tokens);
    Ok(tokens)
}

struct Lexer<'a> {
    source: &'a str,
    /// Absolute offset of `source[0]`
    origin: usize,
    cursor: Position,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, origin: Position) -> Self {
        Self {
            source,
            origin: origin.offset(),
            cursor: origin,
            tokens: Vec::new(),
        }
    }

    /// Move the cursor to a byte offset relative to `source`.
    ///
    /// Returns whether a newline was crossed.
    fn advance_to(&mut self, relative: usize) -> bool {
        let current = self.cursor.offset() - self.origin;
        let mut newline = false;

        for c in self.source[current..relative].chars() {
            newline |= c == '\n';
            self.cursor.advance(c);
        }

        newline
    }

    fn run(mut self) -> LexResult<Vec<Token>> {
        let source = self.source;
        let mut areas = Area::lexer(source);

        while let Some(area) = areas.next() {
            let range = areas.span();
            let newline = self.advance_to(range.start);
            let start = self.cursor;

            let flags = if newline || self.tokens.is_empty() {
                TokenFlags::LINE_START
            } else {
                TokenFlags::NONE
            };

            let Ok(area) = area else {
                let ch = source[range.start..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(LexError::UnrecognizedCharacter { ch, position: start });
            };

            match area {
                Area::Text => {
                    self.advance_to(range.end);
                    let token = text_token(areas.slice(), Span::new(start, self.cursor), flags);
                    self.tokens.push(token);
                }
                Area::Number => {
                    self.advance_to(range.end);
                    let text = areas.slice();

                    // There cannot be number and content tokens side by side
                    if source[range.end..].starts_with(['(', '[', '{']) {
                        return Err(LexError::MissingOperator { position: self.cursor });
                    }

                    let value = parse_number(text).ok_or_else(|| LexError::InvalidNumber {
                        text: SmolStr::new(text),
                        position: start,
                    })?;

                    self.tokens.push(Token::new(
                        TokenKind::Number { text: SmolStr::new(text), value },
                        Span::new(start, self.cursor),
                        flags.with(TokenFlags::VALUE),
                    ));
                }
                Area::Operator => {
                    self.push_operators(areas.slice(), range.start, flags)?;
                }
                Area::Opener => {
                    let end = find_closing(source, range.start)
                        .ok_or(LexError::UnmatchedParenthesis { position: start })?;

                    areas.bump(end - range.end);
                    self.advance_to(end);

                    let text = &source[range.start..end];
                    let kind = text
                        .chars()
                        .next()
                        .and_then(ParenthesisKind::from_opener)
                        .ok_or(LexError::UnmatchedParenthesis { position: start })?;

                    let span = Span::new(start, self.cursor);
                    let content = ContentToken { kind, text: SmolStr::new(text), span };
                    self.tokens.push(Token::new(TokenKind::Content(content), span, flags));
                }
                Area::Closer => {
                    return Err(LexError::UnmatchedParenthesis { position: start });
                }
            }
        }

        Ok(self.tokens)
    }

    /// Split an operator run into symbols and push one token per symbol.
    fn push_operators(&mut self, text: &str, offset: usize, flags: TokenFlags) -> LexResult<()> {
        let symbols = match split_operators(text) {
            Ok(symbols) => symbols,
            Err(bad) => {
                self.advance_to(offset + bad);
                let rest: String = text[bad..].chars().take_while(|c| !c.is_whitespace()).collect();
                return Err(LexError::UnrecognizedOperator {
                    text: SmolStr::new(rest),
                    position: self.cursor,
                });
            }
        };

        for (index, (local, operator)) in symbols.into_iter().enumerate() {
            self.advance_to(offset + local);
            let start = self.cursor;
            self.advance_to(offset + local + operator.symbol().len());

            let flags = if index == 0 { flags } else { TokenFlags::NONE };
            self.tokens.push(Token::new(
                TokenKind::Operator(operator),
                Span::new(start, self.cursor),
                flags,
            ));
        }

        Ok(())
    }
}

/// Promote a text area: operator spelling, keyword, or identifier.
fn text_token(text: &str, span: Span, flags: TokenFlags) -> Token {
    if let Some(operator) = Operator::from_symbol(text) {
        Token::new(TokenKind::Operator(operator), span, flags)
    } else if let Some(keyword) = Keyword::from_text(text) {
        Token::new(TokenKind::Keyword(keyword), span, flags)
    } else {
        Token::new(
            TokenKind::Identifier(SmolStr::new(text)),
            span,
            flags.with(TokenFlags::VALUE),
        )
    }
}

fn parse_number(text: &str) -> Option<NumberValue> {
    if text.contains('.') {
        text.parse::<f64>().ok().map(NumberValue::Decimal)
    } else {
        text.parse::<i64>().ok().map(NumberValue::Integer)
    }
}

/// Find the end of the bracketed run opening at `start`.
///
/// Only delimiters of the same kind are counted. Returns the byte offset just
/// past the matching closer.
fn find_closing(source: &str, start: usize) -> Option<usize> {
    let kind = ParenthesisKind::from_opener(source[start..].chars().next()?)?;
    let (opener, closer) = (kind.opener(), kind.closer());
    let mut count = 0usize;

    for (offset, c) in source[start..].char_indices() {
        if c == opener {
            count += 1;
        } else if c == closer {
            count -= 1;

            if count == 0 {
                return Some(start + offset + c.len_utf8());
            }
        }
    }

    None
}

/// Fold `identifier (...)` pairs into function-call tokens, right to left.
fn fold_functions(tokens: &mut Vec<Token>) {
    if tokens.len() < 2 {
        return;
    }

    let mut folded = Vec::with_capacity(tokens.len());
    let mut reversed = std::mem::take(tokens).into_iter().rev().peekable();

    while let Some(token) = reversed.next() {
        let parameters = match token.kind {
            TokenKind::Content(content) if content.kind == ParenthesisKind::Parenthesis => content,
            kind => {
                folded.push(Token { kind, ..token });
                continue;
            }
        };

        match reversed.next_if(|t| t.identifier().is_some()) {
            Some(name) => {
                let span = name.span.cover(token.span);
                let function = FunctionToken {
                    name: name.identifier().cloned().unwrap_or_default(),
                    name_span: name.span,
                    parameters,
                };

                folded.push(Token::new(
                    TokenKind::Function(function),
                    span,
                    name.flags.with(TokenFlags::VALUE),
                ));
            }
            None => folded.push(Token::new(TokenKind::Content(parameters), token.span, token.flags)),
        }
    }

    folded.reverse();
    *tokens = folded;
}
