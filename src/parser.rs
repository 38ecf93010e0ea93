/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::serializer::ToCss;
use crate::tokenizer::{tokenize, Token};

/// One argument of an engine call, or one entry of the top-level
/// selector list (where only the `Selector` variant occurs).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionArgument {
    /// A bare numeric literal, e.g. the `3` in `:right-of(div, 3)`.
    Number(f64),
    /// A quoted string literal, e.g. the `"OK"` in `:text("OK")`.
    String(String),
    /// A selector argument.
    Selector(ComplexSelector),
}

/// A sequence of compound selectors related by combinators, e.g.
/// `div > span .cls`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComplexSelector {
    /// The clauses, in source order. Never empty in parser output.
    pub simples: SmallVec<[SelectorClause; 2]>,
}

/// One compound selector together with its relation to the *next* clause.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectorClause {
    /// The compound selector itself.
    pub selector: SimpleSelector,
    /// How the following clause relates to this one. `Descendant` for
    /// the last clause.
    pub combinator: Combinator,
}

/// A selector combinator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Combinator {
    /// Whitespace between compound selectors.
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    LaterSibling,
}

/// A compound selector: a raw CSS fragment (type, class, id, attribute
/// and unrecognized pseudo-class parts, in canonical source form)
/// followed by the recognized pseudo-class calls attached to it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleSelector {
    /// The raw fragment. `None` when the compound consisted of
    /// recognized pseudo-classes only; never `Some("")`.
    pub css: Option<String>,
    /// The recognized pseudo-class calls, in source order.
    pub functions: Vec<EngineCall>,
}

/// A recognized pseudo-class occurrence, e.g. `:not(span)` or a bare
/// `:scope`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineCall {
    /// The pseudo-class name, lowercased.
    pub name: String,
    /// The parsed arguments. Empty for `:name` and `:name()` alike.
    pub args: Vec<FunctionArgument>,
    /// Whether the source carried an argument list. `:scope` and
    /// `:scope()` parse identically except for this flag, and
    /// re-serialize to their original spelling through it.
    pub has_parens: bool,
}

/// The result of [`parse`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedSelector {
    /// The top-level comma-separated list. Every entry is a
    /// [`FunctionArgument::Selector`].
    pub selector: Vec<FunctionArgument>,
    /// Every recognized pseudo-class name that occurs anywhere in the
    /// tree, deduplicated, in first-encounter order.
    pub names: Vec<String>,
}

/// The error returned for selector text the grammar rejects.
///
/// The tokenizer never fails, so this covers every failure mode of
/// [`parse`]; the message always embeds the full original selector.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct InvalidSelectorError {
    message: String,
}

impl InvalidSelectorError {
    /// The human-readable description, identical to the `Display` output.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn unexpected_token(token: &Token, source: &str) -> InvalidSelectorError {
        InvalidSelectorError {
            message: format!(
                "Unexpected token \"{}\" while parsing selector \"{}\"",
                token.to_css_string(),
                source
            ),
        }
    }
}

/// Returns whether a type-erased error is an [`InvalidSelectorError`],
/// so callers holding a `Box<dyn Error>` can tell bad selector text
/// apart from other failures without naming the concrete type.
pub fn is_invalid_selector_error(error: &(dyn std::error::Error + 'static)) -> bool {
    error.is::<InvalidSelectorError>()
}

/// Parses selector text into a [`ParsedSelector`].
///
/// `custom_names` lists the pseudo-class names (lowercase) to parse
/// into [`EngineCall`] nodes with structured arguments. Any other
/// pseudo-class is copied through verbatim as part of the raw CSS
/// fragment, e.g. `:nth-child(3n+1)` survives untouched.
///
/// ```
/// use std::collections::HashSet;
/// let names: HashSet<String> = ["is".to_string(), "scope".to_string()].into();
/// let parsed = css_selector_parser::parse(":is(foo, bar > baz)", &names).unwrap();
/// assert_eq!(parsed.names, vec!["is"]);
/// assert_eq!(css_selector_parser::serialize(&parsed.selector), ":is(foo, bar > baz)");
/// ```
pub fn parse(
    selector: &str,
    custom_names: &HashSet<String>,
) -> Result<ParsedSelector, InvalidSelectorError> {
    let mut parser = SelectorParser {
        tokens: tokenize(selector),
        pos: 0,
        source: selector,
        custom_names,
        names: Vec::new(),
    };
    parser.reject_unsupported_tokens()?;
    let args = parser.parse_argument_list(true)?;
    if !parser.is_eof() || args.is_empty() {
        return Err(parser.unexpected());
    }
    Ok(ParsedSelector {
        selector: args,
        names: parser.names,
    })
}

struct SelectorParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    custom_names: &'a HashSet<String>,
    names: Vec<String>,
}

impl<'a> SelectorParser<'a> {
    // The token vector always ends with EOF, so `pos` never runs past it.
    #[inline]
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn unexpected(&self) -> InvalidSelectorError {
        InvalidSelectorError::unexpected_token(self.current(), self.source)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        *self.current() == Token::EOF
    }

    fn skip_whitespace(&mut self) {
        while *self.current() == Token::WhiteSpace {
            self.pos += 1;
        }
    }

    /// Tokens that can never occur in a selector. Rejecting them up
    /// front keeps the grammar rules below free of bad-token cases.
    fn reject_unsupported_tokens(&self) -> Result<(), InvalidSelectorError> {
        for token in &self.tokens {
            if matches!(
                token,
                Token::AtKeyword(_)
                    | Token::BadString
                    | Token::BadUrl
                    | Token::Column
                    | Token::CDO
                    | Token::CDC
                    | Token::Semicolon
                    | Token::CurlyBracketBlock
                    | Token::CloseCurlyBracket
                    | Token::Url(_)
                    | Token::Percentage(_)
            ) {
                return Err(InvalidSelectorError::unexpected_token(token, self.source));
            }
        }
        Ok(())
    }

    /// The combinator a `Delim` token denotes, if any.
    fn clause_combinator(&self) -> Option<Combinator> {
        match *self.current() {
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::NextSibling),
            Token::Delim('~') => Some(Combinator::LaterSibling),
            _ => None,
        }
    }

    #[inline]
    fn is_clause_end(&self) -> bool {
        matches!(
            *self.current(),
            Token::Comma | Token::CloseParenthesis | Token::EOF
        )
    }

    fn record_name(&mut self, name: &str) {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_owned());
        }
    }

    /// Parses a comma-separated argument list up to (not including) a
    /// closing parenthesis or EOF. At the top level (`top_level`),
    /// number and string literals are not admitted, so `23` alone
    /// fails with the literal as the offending token.
    fn parse_argument_list(
        &mut self,
        top_level: bool,
    ) -> Result<Vec<FunctionArgument>, InvalidSelectorError> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if matches!(*self.current(), Token::CloseParenthesis | Token::EOF) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_argument(top_level)?);
            self.skip_whitespace();
            if *self.current() == Token::Comma {
                self.pos += 1;
                self.skip_whitespace();
            } else {
                return Ok(args);
            }
        }
    }

    fn parse_argument(&mut self, top_level: bool) -> Result<FunctionArgument, InvalidSelectorError> {
        match self.current().clone() {
            Token::Number(ref value) if !top_level => {
                self.pos += 1;
                Ok(FunctionArgument::Number(value.value))
            }
            Token::QuotedString(value) if !top_level => {
                self.pos += 1;
                Ok(FunctionArgument::String(value))
            }
            _ => Ok(FunctionArgument::Selector(self.parse_complex_selector()?)),
        }
    }

    fn parse_complex_selector(&mut self) -> Result<ComplexSelector, InvalidSelectorError> {
        let mut simples: SmallVec<[SelectorClause; 2]> = SmallVec::new();
        self.skip_whitespace();
        // A leading combinator is relative to the scoping root.
        if let Some(combinator) = self.clause_combinator() {
            simples.push(SelectorClause {
                selector: self.implicit_scope(),
                combinator,
            });
            self.pos += 1;
        }
        loop {
            self.skip_whitespace();
            if let Some(combinator) = self.clause_combinator() {
                match simples.last_mut() {
                    // Two combinators in a row, as in `div > > span`.
                    Some(last) if last.combinator == Combinator::Descendant => {
                        last.combinator = combinator;
                    }
                    _ => return Err(self.unexpected()),
                }
                self.pos += 1;
                self.skip_whitespace();
            }
            if self.is_clause_end() {
                // A trailing combinator has no clause to attach to.
                match simples.last() {
                    Some(last) if last.combinator == Combinator::Descendant => break,
                    _ => return Err(self.unexpected()),
                }
            }
            let selector = self.parse_simple_selector()?;
            simples.push(SelectorClause {
                selector,
                combinator: Combinator::Descendant,
            });
        }
        Ok(ComplexSelector { simples })
    }

    fn implicit_scope(&mut self) -> SimpleSelector {
        self.record_name("scope");
        SimpleSelector {
            css: None,
            functions: vec![EngineCall {
                name: "scope".to_owned(),
                args: Vec::new(),
                has_parens: true,
            }],
        }
    }

    /// Parses one compound selector: consecutive type/class/id/
    /// attribute/pseudo-class parts with no whitespace between them.
    fn parse_simple_selector(&mut self) -> Result<SimpleSelector, InvalidSelectorError> {
        let mut css = String::new();
        let mut functions = Vec::new();
        loop {
            match self.current().clone() {
                Token::Ident(_) | Token::Hash(..) => {
                    css.push_str(&self.current().to_css_string());
                    self.pos += 1;
                }
                Token::Delim('*') => {
                    css.push('*');
                    self.pos += 1;
                }
                Token::Delim('.') => {
                    self.pos += 1;
                    match *self.current() {
                        Token::Ident(_) => {
                            css.push('.');
                            css.push_str(&self.current().to_css_string());
                            self.pos += 1;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                Token::Colon => {
                    self.pos += 1;
                    match self.current().clone() {
                        Token::Ident(name) => {
                            self.pos += 1;
                            let name = name.to_ascii_lowercase();
                            if self.custom_names.contains(&name) {
                                self.record_name(&name);
                                functions.push(EngineCall {
                                    name,
                                    args: Vec::new(),
                                    has_parens: false,
                                });
                            } else {
                                css.push(':');
                                serialized_onto(&Token::Ident(name), &mut css);
                            }
                        }
                        Token::Function(name) => {
                            self.pos += 1;
                            let name = name.to_ascii_lowercase();
                            if self.custom_names.contains(&name) {
                                // Recorded before the arguments so that
                                // `names` keeps source order.
                                self.record_name(&name);
                                let args = self.parse_argument_list(false)?;
                                if *self.current() != Token::CloseParenthesis {
                                    return Err(self.unexpected());
                                }
                                self.pos += 1;
                                functions.push(EngineCall {
                                    name,
                                    args,
                                    has_parens: true,
                                });
                            } else {
                                self.copy_unrecognized_function(&name, &mut css)?;
                            }
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                Token::SquareBracketBlock => {
                    // Attribute selectors are copied through verbatim.
                    css.push('[');
                    self.pos += 1;
                    loop {
                        match *self.current() {
                            Token::CloseSquareBracket => {
                                self.pos += 1;
                                break;
                            }
                            Token::EOF => return Err(self.unexpected()),
                            ref token => {
                                serialized_onto(token, &mut css);
                                self.pos += 1;
                            }
                        }
                    }
                    css.push(']');
                }
                _ => break,
            }
        }
        if css.is_empty() && functions.is_empty() {
            return Err(self.unexpected());
        }
        Ok(SimpleSelector {
            css: if css.is_empty() { None } else { Some(css) },
            functions,
        })
    }

    /// Copies an unrecognized pseudo-class call into the raw fragment,
    /// balancing nested parentheses with a depth counter rather than
    /// recursing.
    fn copy_unrecognized_function(
        &mut self,
        name: &str,
        css: &mut String,
    ) -> Result<(), InvalidSelectorError> {
        css.push(':');
        serialized_onto(&Token::Function(name.to_owned()), css);
        let mut depth = 1usize;
        while depth > 0 {
            match *self.current() {
                Token::EOF => return Err(self.unexpected()),
                Token::Function(_) | Token::ParenthesisBlock => {
                    depth += 1;
                    serialized_onto(self.current(), css);
                }
                Token::CloseParenthesis => {
                    depth -= 1;
                    css.push(')');
                }
                ref token => serialized_onto(token, css),
            }
            self.pos += 1;
        }
        Ok(())
    }
}

fn serialized_onto(token: &Token, css: &mut String) {
    // String destinations never fail.
    token.to_css(css).unwrap();
}
