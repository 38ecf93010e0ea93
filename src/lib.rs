/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A tokenizer, parser and serializer for CSS selector text extended
//! with pluggable pseudo-classes.
//!
//! [`tokenize`] splits selector text into [`Token`]s following the
//! [CSS Syntax Level 3](https://drafts.csswg.org/css-syntax/)
//! tokenization algorithm. [`parse`] builds a selector tree from the
//! tokens; the caller supplies the set of pseudo-class names it knows
//! how to evaluate, and exactly those become structured
//! [`EngineCall`] nodes while everything else (type, class, id and
//! attribute selectors, unknown pseudo-classes) passes through as raw
//! CSS text. [`serialize`] renders a tree back to canonical text.
//!
//! ```
//! use std::collections::HashSet;
//! use css_selector_parser::{parse, serialize};
//!
//! let names: HashSet<String> = ["is".to_string(), "scope".to_string()].into();
//! let parsed = parse(":is(foo, bar>baz)", &names)?;
//! assert_eq!(parsed.names, vec!["is"]);
//! assert_eq!(serialize(&parsed.selector), ":is(foo, bar > baz)");
//! # Ok::<(), css_selector_parser::InvalidSelectorError>(())
//! ```
//!
//! Matching elements against the parsed tree is out of scope: the tree
//! and the [`ParsedSelector::names`] list are the entire contract with
//! whatever evaluates the selector.

#![deny(missing_docs)]

pub use crate::parser::{
    is_invalid_selector_error, parse, Combinator, ComplexSelector, EngineCall, FunctionArgument,
    InvalidSelectorError, ParsedSelector, SelectorClause, SimpleSelector,
};
pub use crate::serializer::{
    serialize, serialize_identifier, serialize_name, serialize_string, ToCss,
};
pub use crate::tokenizer::{tokenize, HashKind, NumericValue, Token};

mod parser;
mod serializer;
mod tokenizer;

#[cfg(test)]
mod tests;
