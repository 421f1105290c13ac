//! Property-based tests for the lexer.
//!
//! Generates token-shaped fragments joined by arbitrary whitespace and checks
//! that tokenizing never loses or invents source text.

use proptest::prelude::*;
use weave::keywords::{KEYWORDS, OPERATORS};
use weave::parser::{LexError, tokenize};
use weave::project::normalize;

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

fn arb_identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,8}"
}

fn arb_number() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{1,6}", "[0-9]{1,3}\\.[0-9]{1,3}"]
}

fn arb_operator() -> impl Strategy<Value = String> {
    prop::sample::select(OPERATORS).prop_map(|o| o.symbol().to_string())
}

fn arb_keyword() -> impl Strategy<Value = String> {
    prop::sample::select(KEYWORDS).prop_map(|k| k.as_str().to_string())
}

/// Balanced bracketed content; the inside is never tokenized eagerly.
fn arb_content() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("()".to_string()),
        "[a-z]{1,4}".prop_map(|s| format!("({}, 1)", s)),
        "[a-z]{1,4}".prop_map(|s| format!("{{\n\t{} = {}\r\n}}", s, s)),
        "[a-z]{1,4}".prop_map(|s| format!("[{}]", s)),
    ]
}

fn arb_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_identifier(),
        2 => arb_number(),
        3 => arb_operator(),
        1 => arb_keyword(),
        2 => arb_content(),
    ]
}

fn arb_separator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![" ", "  ", "\n", "\t", "\r\n", " \n\t"])
}

fn arb_source() -> impl Strategy<Value = String> {
    prop::collection::vec((arb_fragment(), arb_separator()), 0..24).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(fragment, separator)| format!("{}{}", fragment, separator))
            .collect()
    })
}

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_tokens_reproduce_source(source in arb_source()) {
        let normalized = normalize(&source);
        let tokens = tokenize(&normalized).unwrap();

        let joined: String = tokens.iter().map(|t| t.text().into_owned()).collect();
        prop_assert_eq!(without_whitespace(&joined), without_whitespace(&normalized));
    }

    #[test]
    fn prop_normalized_source_has_no_tabs_or_crlf(source in arb_source()) {
        let normalized = normalize(&source);
        prop_assert!(!normalized.contains('\t'));
        prop_assert!(!normalized.contains('\r'));
    }

    #[test]
    fn prop_positions_increase(source in arb_source()) {
        let tokens = tokenize(&normalize(&source)).unwrap();

        for pair in tokens.windows(2) {
            prop_assert!(pair[0].span.end.absolute <= pair[1].span.start.absolute);
        }
    }

    #[test]
    fn prop_trailing_opener_is_unbalanced(source in arb_source()) {
        let unbalanced = format!("{} (", normalize(&source));
        let is_unmatched = matches!(tokenize(&unbalanced), Err(LexError::UnmatchedParenthesis { .. }));
        prop_assert!(is_unmatched);
    }
}
