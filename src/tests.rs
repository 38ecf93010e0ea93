/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::collections::HashSet;

use crate::parser::{is_invalid_selector_error, parse, FunctionArgument, InvalidSelectorError};
use crate::serializer::{serialize, ToCss};
use crate::tokenizer::{tokenize, HashKind, NumericValue, Token};

fn engine_names() -> HashSet<String> {
    ["text", "not", "has", "react", "scope", "right-of", "is"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Parses with the stock engine set and renders back to text.
fn roundtrip(selector: &str) -> String {
    let parsed = parse(selector, &engine_names()).unwrap();
    serialize(&parsed.selector)
}

fn parse_error(selector: &str) -> InvalidSelectorError {
    parse(selector, &engine_names()).unwrap_err()
}

fn number(repr: &str) -> NumericValue {
    NumericValue {
        value: repr.parse().unwrap(),
        int_value: repr.parse().ok(),
        representation: repr.to_string(),
    }
}

#[test]
fn tokenize_appends_single_eof() {
    assert_eq!(tokenize(""), vec![Token::EOF]);
    let tokens = tokenize("div > span");
    assert_eq!(tokens.last(), Some(&Token::EOF));
    assert_eq!(tokens.iter().filter(|t| **t == Token::EOF).count(), 1);
}

#[test]
fn tokenize_collapses_whitespace() {
    assert_eq!(tokenize(" \t\r\n \u{c} "), vec![Token::WhiteSpace, Token::EOF]);
    assert_eq!(
        tokenize("a  b"),
        vec![
            Token::Ident("a".to_string()),
            Token::WhiteSpace,
            Token::Ident("b".to_string()),
            Token::EOF,
        ]
    );
}

#[test]
fn tokenize_hash_kinds() {
    assert_eq!(
        tokenize("#foo"),
        vec![Token::Hash("foo".to_string(), HashKind::Id), Token::EOF]
    );
    assert_eq!(
        tokenize("#0abc"),
        vec![
            Token::Hash("0abc".to_string(), HashKind::Unrestricted),
            Token::EOF,
        ]
    );
    // `#` with nothing usable after it is a plain delimiter.
    assert_eq!(tokenize("#"), vec![Token::Delim('#'), Token::EOF]);
}

#[test]
fn tokenize_match_operators() {
    assert_eq!(
        tokenize("~=$=^=*=|=||"),
        vec![
            Token::IncludeMatch,
            Token::SuffixMatch,
            Token::PrefixMatch,
            Token::SubstringMatch,
            Token::DashMatch,
            Token::Column,
            Token::EOF,
        ]
    );
    assert_eq!(tokenize("~"), vec![Token::Delim('~'), Token::EOF]);
}

#[test]
fn tokenize_numeric_representation() {
    assert_eq!(tokenize("1.0"), vec![
        Token::Number(NumericValue {
            value: 1.0,
            int_value: None,
            representation: "1.0".to_string(),
        }),
        Token::EOF,
    ]);
    assert_eq!(tokenize("+12"), vec![Token::Number(number("+12")), Token::EOF]);
    assert_eq!(tokenize("3e2"), vec![
        Token::Number(NumericValue {
            value: 300.0,
            int_value: None,
            representation: "3e2".to_string(),
        }),
        Token::EOF,
    ]);
    assert_eq!(tokenize(".5"), vec![
        Token::Number(NumericValue {
            value: 0.5,
            int_value: None,
            representation: ".5".to_string(),
        }),
        Token::EOF,
    ]);
    assert_eq!(tokenize("-4px"), vec![
        Token::Dimension(number("-4"), "px".to_string()),
        Token::EOF,
    ]);
    assert_eq!(tokenize("50%"), vec![Token::Percentage(number("50")), Token::EOF]);
}

#[test]
fn tokenize_escapes() {
    // Hex escape plus the whitespace terminator that belongs to it.
    assert_eq!(
        tokenize("\\41 BC"),
        vec![Token::Ident("ABC".to_string()), Token::EOF]
    );
    // Out-of-range code points collapse to the replacement character.
    assert_eq!(
        tokenize("\\110000 x"),
        vec![Token::Ident("\u{FFFD}x".to_string()), Token::EOF]
    );
    assert_eq!(
        tokenize("\\0 a"),
        vec![Token::Ident("\u{FFFD}a".to_string()), Token::EOF]
    );
    // Non-hex escapes stand for the escaped code point itself.
    assert_eq!(
        tokenize("\\:hover"),
        vec![Token::Ident(":hover".to_string()), Token::EOF]
    );
}

#[test]
fn tokenize_strings() {
    assert_eq!(
        tokenize("'a\\'b'"),
        vec![Token::QuotedString("a'b".to_string()), Token::EOF]
    );
    // Unterminated at EOF is still a string.
    assert_eq!(
        tokenize("\"abc"),
        vec![Token::QuotedString("abc".to_string()), Token::EOF]
    );
    // An unescaped newline aborts the string; the newline is reconsumed.
    let tokens = tokenize("'abc\ndef'");
    assert_eq!(tokens[0], Token::BadString);
    assert_eq!(tokens[1], Token::WhiteSpace);
    // An escaped newline is a line continuation.
    assert_eq!(
        tokenize("'a\\\nb'"),
        vec![Token::QuotedString("ab".to_string()), Token::EOF]
    );
}

#[test]
fn tokenize_urls() {
    assert_eq!(
        tokenize("url( foo.png )"),
        vec![Token::Url("foo.png".to_string()), Token::EOF]
    );
    // A quoted url stays a function token; the string tokenizes on its own.
    assert_eq!(
        tokenize("url( \"x\")"),
        vec![
            Token::Function("url".to_string()),
            Token::WhiteSpace,
            Token::QuotedString("x".to_string()),
            Token::CloseParenthesis,
            Token::EOF,
        ]
    );
    assert_eq!(
        tokenize("url(a b)"),
        vec![Token::BadUrl, Token::EOF]
    );
    assert_eq!(tokenize("url(()"), vec![Token::BadUrl, Token::EOF]);
}

#[test]
fn tokenize_comments() {
    assert_eq!(
        tokenize("/* x */div/* unterminated"),
        vec![Token::Ident("div".to_string()), Token::EOF]
    );
    assert_eq!(tokenize("/**/"), vec![Token::EOF]);
}

#[test]
fn tokenize_cdo_cdc() {
    assert_eq!(
        tokenize("<!-- -->"),
        vec![Token::CDO, Token::WhiteSpace, Token::CDC, Token::EOF]
    );
    assert_eq!(
        tokenize("<div"),
        vec![Token::Delim('<'), Token::Ident("div".to_string()), Token::EOF]
    );
}

#[test]
fn token_mirror() {
    assert_eq!(
        Token::Function("is".to_string()).mirror(),
        Some(Token::CloseParenthesis)
    );
    assert_eq!(
        Token::SquareBracketBlock.mirror(),
        Some(Token::CloseSquareBracket)
    );
    assert_eq!(
        Token::CloseCurlyBracket.mirror(),
        Some(Token::CurlyBracketBlock)
    );
    assert_eq!(Token::Comma.mirror(), None);
}

#[test]
fn token_source_forms() {
    assert_eq!(
        Token::Hash("0abc".to_string(), HashKind::Unrestricted).to_css_string(),
        "#0abc"
    );
    assert_eq!(
        Token::QuotedString("a\"b\\c".to_string()).to_css_string(),
        "\"a\\\"b\\\\c\""
    );
    assert_eq!(Token::Dimension(number("3"), "em".to_string()).to_css_string(), "3em");
    // A unit that would re-read as an exponent gets its `e` escaped.
    assert_eq!(
        Token::Dimension(number("3"), "e2".to_string()).to_css_string(),
        "3\\65 2"
    );
    assert_eq!(Token::Url("a".to_string()).to_css_string(), "url(\"a\")");
    assert_eq!(Token::EOF.to_css_string(), "");
    // A lone `-` identifier must not come back as a delimiter.
    assert_eq!(Token::Ident("-".to_string()).to_css_string(), "\\-");
    // The rendering of a bad string is itself a bad string.
    let bad = Token::BadString.to_css_string();
    assert_eq!(bad, "\"<bad string>\n");
    assert_eq!(tokenize(&bad)[0], Token::BadString);
}

#[test]
fn dash_identifier_roundtrips() {
    assert_eq!(tokenize("\\-"), vec![Token::Ident("-".to_string()), Token::EOF]);
    let once = roundtrip("\\-");
    assert_eq!(once, "\\-");
    assert_eq!(roundtrip(&once), once);
}

#[test]
fn roundtrip_plain_selectors() {
    assert_eq!(roundtrip("div"), "div");
    assert_eq!(roundtrip("div.class#id"), "div.class#id");
    assert_eq!(roundtrip("*"), "*");
    assert_eq!(roundtrip("div>span+.class"), "div > span + .class");
    assert_eq!(roundtrip("div ~ span"), "div ~ span");
}

#[test]
fn leading_combinator_implies_scope() {
    assert_eq!(roundtrip(">span"), ":scope() > span");
    assert_eq!(roundtrip("+ span"), ":scope() + span");
    let parsed = parse(">span", &engine_names()).unwrap();
    assert_eq!(parsed.names, vec!["scope"]);
}

#[test]
fn functions_follow_raw_fragment() {
    assert_eq!(roundtrip("div:not(span):hover"), "div:hover:not(span)");
}

#[test]
fn nested_selector_arguments() {
    assert_eq!(
        roundtrip(":is(foo, bar>baz.cls+:not(qux))"),
        ":is(foo, bar > baz.cls + :not(qux))"
    );
    assert_eq!(
        roundtrip("div:has(> span, ~ p)"),
        "div:has(:scope() > span, :scope() ~ p)"
    );
}

#[test]
fn bare_and_called_pseudo_classes_are_distinct() {
    assert_eq!(roundtrip(":scope"), ":scope");
    assert_eq!(roundtrip(":scope()"), ":scope()");
    let bare = parse(":scope", &engine_names()).unwrap();
    let called = parse(":scope()", &engine_names()).unwrap();
    assert_ne!(bare.selector, called.selector);
}

#[test]
fn pseudo_class_names_are_lowercased() {
    assert_eq!(roundtrip("div:NOT(span)"), "div:not(span)");
    // Raw fragments keep their case.
    assert_eq!(roundtrip("DIV.Class"), "DIV.Class");
}

#[test]
fn names_are_unique_in_source_order() {
    let parsed = parse("div:not(:has(span)):not(div):text(\"x\")", &engine_names()).unwrap();
    assert_eq!(parsed.names, vec!["not", "has", "text"]);
}

#[test]
fn number_and_string_arguments() {
    assert_eq!(roundtrip(":right-of(div, 50)"), ":right-of(div, 50)");
    assert_eq!(roundtrip(":text(\"hi\")"), ":text(\"hi\")");
    assert_eq!(roundtrip(":text('hi')"), ":text(\"hi\")");
    let parsed = parse(":right-of(div, 50.5)", &engine_names()).unwrap();
    match parsed.selector[0] {
        FunctionArgument::Selector(ref complex) => {
            let call = &complex.simples[0].selector.functions[0];
            assert_eq!(call.args[1], FunctionArgument::Number(50.5));
        }
        ref other => panic!("expected a selector at the top level, got {:?}", other),
    }
}

#[test]
fn unrecognized_pseudo_classes_pass_through() {
    assert_eq!(roundtrip("li:hover"), "li:hover");
    assert_eq!(roundtrip("div:nth-child(3n+1)"), "div:nth-child(3n+1)");
    // Nested parentheses inside an unrecognized call are balanced.
    assert_eq!(
        roundtrip("div:matches(a:hover, b:visited)"),
        "div:matches(a:hover, b:visited)"
    );
}

#[test]
fn attribute_blocks_pass_through() {
    assert_eq!(roundtrip("[attr]"), "[attr]");
    assert_eq!(roundtrip("[data-x=\"a b\"]"), "[data-x=\"a b\"]");
    assert_eq!(roundtrip("a[href^=\"https:\"]"), "a[href^=\"https:\"]");
}

#[test]
fn comma_separated_top_level_list() {
    assert_eq!(roundtrip("div , span"), "div, span");
    let parsed = parse("a, b, c", &engine_names()).unwrap();
    assert_eq!(parsed.selector.len(), 3);
}

#[test]
fn malformed_selectors_are_rejected() {
    for selector in [
        "", ".", "#", "[attr=", ":not(div", "div)", "()", "div,", ",div", "div,,span",
        "div > > span", "\"foo\"", "23",
    ] {
        let error = parse_error(selector);
        assert!(
            is_invalid_selector_error(&error),
            "wrong error kind for {:?}",
            selector
        );
        assert!(
            error.message().contains(selector),
            "message {:?} does not embed {:?}",
            error.message(),
            selector
        );
    }
}

#[test]
fn error_messages_name_the_offending_token() {
    assert_eq!(
        parse_error("div)").message(),
        "Unexpected token \")\" while parsing selector \"div)\""
    );
    assert_eq!(
        parse_error("23").message(),
        "Unexpected token \"23\" while parsing selector \"23\""
    );
    // EOF renders as the empty source form.
    assert_eq!(
        parse_error(":not(div").message(),
        "Unexpected token \"\" while parsing selector \":not(div\""
    );
}

#[test]
fn unsupported_tokens_are_rejected_anywhere() {
    for selector in [
        "@media div", "div;span", "div || span", "url(x)", "50%", "<!-- div -->",
        "div { color: red }",
    ] {
        let error = parse_error(selector);
        assert!(is_invalid_selector_error(&error), "accepted {:?}", selector);
    }
}

#[test]
fn error_discriminates_through_dyn_error() {
    let boxed: Box<dyn std::error::Error> = Box::new(parse_error("23"));
    assert!(is_invalid_selector_error(boxed.as_ref()));
    let other: Box<dyn std::error::Error> = "nope".parse::<i32>().unwrap_err().into();
    assert!(!is_invalid_selector_error(other.as_ref()));
}

#[test]
fn serialization_is_idempotent() {
    for selector in [
        "div>span+.class",
        ":is(foo, bar>baz.cls+:not(qux))",
        ">span",
        "div:has(:right-of(a, 3), :text(\"x\"))",
        "a[href^=\"https:\"]:not([hidden])",
    ] {
        let once = roundtrip(selector);
        assert_eq!(roundtrip(&once), once, "not idempotent for {:?}", selector);
    }
}

#[test]
fn serialize_is_total_for_hand_built_trees() {
    assert_eq!(serialize(&[FunctionArgument::Number(1.5)]), "1.5");
    assert_eq!(serialize(&[FunctionArgument::Number(3.0)]), "3");
    assert_eq!(serialize(&[FunctionArgument::Number(-0.0)]), "-0");
    assert_eq!(
        serialize(&[FunctionArgument::String("a\"b".to_string())]),
        "\"a\\\"b\""
    );
    assert_eq!(
        serialize(&[
            FunctionArgument::Number(1.0),
            FunctionArgument::String("x".to_string()),
        ]),
        "1, \"x\""
    );
}
