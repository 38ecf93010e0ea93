/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt::{self, Write};

use crate::parser::{
    Combinator, ComplexSelector, EngineCall, FunctionArgument, SelectorClause, SimpleSelector,
};
use crate::tokenizer::{HashKind, Token};

/// Trait for things the can be serialized in CSS syntax.
pub trait ToCss {
    /// Serialize `self` in CSS syntax, writing to `dest`.
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write;

    /// Serialize `self` in CSS syntax and return a string.
    ///
    /// (This is a convenience wrapper for `to_css` and probably should not be overridden.)
    #[inline]
    fn to_css_string(&self) -> String {
        let mut s = String::new();
        self.to_css(&mut s).unwrap();
        s
    }
}

/// Renders a parsed selector list back to canonical text.
///
/// Top-level entries are joined with `", "`. Serialization is total: any
/// tree value, including ones assembled by hand rather than returned by
/// [`parse`](crate::parse), produces a string.
pub fn serialize(args: &[FunctionArgument]) -> String {
    let mut s = String::new();
    serialize_arguments(args, &mut s).unwrap();
    s
}

fn serialize_arguments<W>(args: &[FunctionArgument], dest: &mut W) -> fmt::Result
where
    W: fmt::Write,
{
    let mut first = true;
    for arg in args {
        if !first {
            dest.write_str(", ")?;
        }
        first = false;
        arg.to_css(dest)?;
    }
    Ok(())
}

impl ToCss for FunctionArgument {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {
            FunctionArgument::Number(value) => write_number(value, dest),
            FunctionArgument::String(ref value) => serialize_string(value, dest),
            FunctionArgument::Selector(ref selector) => selector.to_css(dest),
        }
    }
}

impl ToCss for ComplexSelector {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let mut first = true;
        for clause in &self.simples {
            if !first {
                dest.write_char(' ')?;
            }
            first = false;
            clause.to_css(dest)?;
        }
        Ok(())
    }
}

impl ToCss for SelectorClause {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        self.selector.to_css(dest)?;
        // The descendant combinator is implied by clause adjacency.
        if self.combinator != Combinator::Descendant {
            dest.write_char(' ')?;
            self.combinator.to_css(dest)?;
        }
        Ok(())
    }
}

impl ToCss for Combinator {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_str(match *self {
            Combinator::Descendant => "",
            Combinator::Child => ">",
            Combinator::NextSibling => "+",
            Combinator::LaterSibling => "~",
        })
    }
}

impl ToCss for SimpleSelector {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        if let Some(ref css) = self.css {
            dest.write_str(css)?;
        }
        for function in &self.functions {
            function.to_css(dest)?;
        }
        Ok(())
    }
}

impl ToCss for EngineCall {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        dest.write_char(':')?;
        serialize_identifier(&self.name, dest)?;
        if self.has_parens || !self.args.is_empty() {
            dest.write_char('(')?;
            serialize_arguments(&self.args, dest)?;
            dest.write_char(')')?;
        }
        Ok(())
    }
}

impl ToCss for Token {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {
            Token::WhiteSpace => dest.write_char(' ')?,
            Token::Ident(ref value) => serialize_identifier(value, dest)?,
            Token::Function(ref name) => {
                serialize_identifier(name, dest)?;
                dest.write_char('(')?;
            }
            Token::AtKeyword(ref value) => {
                dest.write_char('@')?;
                serialize_identifier(value, dest)?;
            }
            Token::Hash(ref value, kind) => {
                dest.write_char('#')?;
                match kind {
                    HashKind::Id => serialize_identifier(value, dest)?,
                    HashKind::Unrestricted => serialize_name(value, dest)?,
                }
            }
            Token::QuotedString(ref value) => serialize_string(value, dest)?,
            // The embedded newline keeps the rendering a bad string
            // when re-tokenized.
            Token::BadString => dest.write_str("\"<bad string>\n")?,
            Token::Url(ref value) => {
                dest.write_str("url(")?;
                serialize_string(value, dest)?;
                dest.write_char(')')?;
            }
            Token::BadUrl => dest.write_str("url(<bad url>)")?,
            // A lone backslash only tokenizes as a delimiter before a
            // newline, so the source form restores that newline.
            Token::Delim('\\') => dest.write_str("\\\n")?,
            Token::Delim(value) => dest.write_char(value)?,
            Token::Number(ref value) => dest.write_str(&value.representation)?,
            Token::Percentage(ref value) => {
                dest.write_str(&value.representation)?;
                dest.write_char('%')?;
            }
            Token::Dimension(ref value, ref unit) => {
                dest.write_str(&value.representation)?;
                // A unit like `e5` or `e-5` would fuse with the number as
                // scientific notation when re-tokenized; escape the `e`.
                let mut chars = unit.chars();
                let ambiguous = matches!(chars.next(), Some('e') | Some('E'))
                    && matches!(chars.next(), None | Some('-') | Some('0'..='9'));
                if ambiguous {
                    dest.write_str("\\65 ")?;
                    serialize_name(&unit[1..], dest)?;
                } else {
                    serialize_identifier(unit, dest)?;
                }
            }
            Token::IncludeMatch => dest.write_str("~=")?,
            Token::DashMatch => dest.write_str("|=")?,
            Token::PrefixMatch => dest.write_str("^=")?,
            Token::SuffixMatch => dest.write_str("$=")?,
            Token::SubstringMatch => dest.write_str("*=")?,
            Token::Column => dest.write_str("||")?,
            Token::Comma => dest.write_char(',')?,
            Token::Colon => dest.write_char(':')?,
            Token::Semicolon => dest.write_char(';')?,
            Token::ParenthesisBlock => dest.write_char('(')?,
            Token::CloseParenthesis => dest.write_char(')')?,
            Token::SquareBracketBlock => dest.write_char('[')?,
            Token::CloseSquareBracket => dest.write_char(']')?,
            Token::CurlyBracketBlock => dest.write_char('{')?,
            Token::CloseCurlyBracket => dest.write_char('}')?,
            Token::CDO => dest.write_str("<!--")?,
            Token::CDC => dest.write_str("-->")?,
            Token::EOF => {}
        }
        Ok(())
    }
}

/// Writes a numeric argument in its shortest form.
fn write_number<W>(value: f64, dest: &mut W) -> fmt::Result
where
    W: fmt::Write,
{
    // dtoa renders -0.0 with the sign; keep that, but drop the ".0".
    if value == 0.0 && value.is_sign_negative() {
        return dest.write_str("-0");
    }
    let int_value = value as i64;
    if int_value as f64 == value && value.abs() < 1e15 {
        let mut buffer = itoa::Buffer::new();
        dest.write_str(buffer.format(int_value))
    } else if value.is_finite() {
        dtoa_short::write(dest, value)?;
        Ok(())
    } else {
        write!(dest, "{}", value)
    }
}

/// Writes `value` escaped such that it re-tokenizes as a single
/// `Ident` with the same value.
///
/// <https://drafts.csswg.org/cssom/#serialize-an-identifier>
pub fn serialize_identifier<W>(value: &str, dest: &mut W) -> fmt::Result
where
    W: fmt::Write,
{
    // A lone `-` would re-tokenize as a delimiter.
    if value == "-" {
        return dest.write_str("\\-");
    }
    let mut leading_minus = false;
    for (i, c) in value.chars().enumerate() {
        match c {
            '\0' => dest.write_char('\u{FFFD}')?,
            '\u{1}'..='\u{1F}' | '\u{7F}' => write!(dest, "\\{:x} ", c as u32)?,
            '0'..='9' if i == 0 || (i == 1 && leading_minus) => {
                write!(dest, "\\{:x} ", c as u32)?
            }
            '-' if i == 0 => {
                leading_minus = true;
                dest.write_char(c)?;
            }
            c if is_css_name_char(c) => dest.write_char(c)?,
            c => {
                dest.write_char('\\')?;
                dest.write_char(c)?;
            }
        }
    }
    Ok(())
}

/// Writes `value` with the code points that cannot appear in a
/// `<name>` escaped. Unlike [`serialize_identifier`], a leading digit
/// passes through unescaped.
pub fn serialize_name<W>(value: &str, dest: &mut W) -> fmt::Result
where
    W: fmt::Write,
{
    for c in value.chars() {
        match c {
            '\0' => dest.write_char('\u{FFFD}')?,
            c if is_css_name_char(c) => dest.write_char(c)?,
            c => write!(dest, "\\{:x} ", c as u32)?,
        }
    }
    Ok(())
}

/// Writes `value` as a double-quoted CSS string literal, quotes included.
pub fn serialize_string<W>(value: &str, dest: &mut W) -> fmt::Result
where
    W: fmt::Write,
{
    dest.write_char('"')?;
    for c in value.chars() {
        match c {
            '\0' => dest.write_char('\u{FFFD}')?,
            '"' => dest.write_str("\\\"")?,
            '\\' => dest.write_str("\\\\")?,
            '\u{1}'..='\u{1F}' | '\u{7F}' => write!(dest, "\\{:x} ", c as u32)?,
            c => dest.write_char(c)?,
        }
    }
    dest.write_char('"')
}

#[inline]
fn is_css_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
