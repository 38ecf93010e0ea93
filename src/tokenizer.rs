/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

// https://drafts.csswg.org/css-syntax/#tokenization

use crate::serializer::ToCss;

/// One of the pieces the selector input is broken into.
///
/// String-valued tokens store the decoded value: backslash escapes have
/// already been resolved, so `\64 iv` and `div` produce the same `Ident`.
/// The canonical source form of any token is available through
/// [`ToCss`](crate::ToCss).
#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// A run of [whitespace](https://drafts.csswg.org/css-syntax/#whitespace).
    ///
    /// Consecutive whitespace code points collapse into a single token;
    /// the canonical source form is one space.
    WhiteSpace,

    /// An [`<ident-token>`](https://drafts.csswg.org/css-syntax/#ident-token-diagram)
    Ident(String),

    /// A [`<function-token>`](https://drafts.csswg.org/css-syntax/#function-token-diagram)
    ///
    /// The value (name) does not include the `(` marker.
    Function(String),

    /// An [`<at-keyword-token>`](https://drafts.csswg.org/css-syntax/#at-keyword-token-diagram)
    ///
    /// The value does not include the `@` marker.
    AtKeyword(String),

    /// A [`<hash-token>`](https://drafts.csswg.org/css-syntax/#hash-token-diagram)
    ///
    /// The value does not include the `#` marker.
    Hash(String, HashKind),

    /// A [`<string-token>`](https://drafts.csswg.org/css-syntax/#string-token-diagram)
    ///
    /// The value does not include the quotes.
    QuotedString(String),

    /// A `<bad-string-token>`: a string literal aborted by an unescaped
    /// newline. Always indicates a parse error in the input.
    BadString,

    /// A [`<url-token>`](https://drafts.csswg.org/css-syntax/#url-token-diagram)
    ///
    /// The value does not include the `url(` `)` markers.
    Url(String),

    /// A `<bad-url-token>`. Always indicates a parse error in the input.
    BadUrl,

    /// A `<delim-token>`
    Delim(char),

    /// A [`<number-token>`](https://drafts.csswg.org/css-syntax/#number-token-diagram)
    Number(NumericValue),

    /// A [`<percentage-token>`](https://drafts.csswg.org/css-syntax/#percentage-token-diagram)
    ///
    /// The representation does not include the `%` marker.
    Percentage(NumericValue),

    /// A [`<dimension-token>`](https://drafts.csswg.org/css-syntax/#dimension-token-diagram)
    ///
    /// The second component is the unit.
    Dimension(NumericValue, String),

    /// A `~=` [`<include-match-token>`](https://drafts.csswg.org/css-syntax/#include-match-token-diagram)
    IncludeMatch,

    /// A `|=` [`<dash-match-token>`](https://drafts.csswg.org/css-syntax/#dash-match-token-diagram)
    DashMatch,

    /// A `^=` [`<prefix-match-token>`](https://drafts.csswg.org/css-syntax/#prefix-match-token-diagram)
    PrefixMatch,

    /// A `$=` [`<suffix-match-token>`](https://drafts.csswg.org/css-syntax/#suffix-match-token-diagram)
    SuffixMatch,

    /// A `*=` [`<substring-match-token>`](https://drafts.csswg.org/css-syntax/#substring-match-token-diagram)
    SubstringMatch,

    /// A `||` [`<column-token>`](https://drafts.csswg.org/css-syntax/#column-token-diagram)
    Column,

    /// A `,` `<comma-token>`
    Comma,

    /// A `:` `<colon-token>`
    Colon,

    /// A `;` `<semicolon-token>`
    Semicolon,

    /// A `<(-token>`
    ParenthesisBlock,

    /// A `<)-token>`
    CloseParenthesis,

    /// A `<[-token>`
    SquareBracketBlock,

    /// A `<]-token>`
    CloseSquareBracket,

    /// A `<{-token>`
    CurlyBracketBlock,

    /// A `<}-token>`
    CloseCurlyBracket,

    /// A `<!--` [`<CDO-token>`](https://drafts.csswg.org/css-syntax/#CDO-token-diagram)
    CDO,

    /// A `-->` [`<CDC-token>`](https://drafts.csswg.org/css-syntax/#CDC-token-diagram)
    CDC,

    /// The end-of-input marker. [`tokenize`] appends exactly one, as the
    /// last token of every token sequence.
    EOF,
}

/// The type flag of a [`Token::Hash`].
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HashKind {
    /// The value after `#` would also be a valid identifier, so the hash
    /// can be used as an ID selector.
    Id,

    /// Any other hash.
    Unrestricted,
}

/// The numeric value of `Number`, `Percentage` and `Dimension` tokens.
#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericValue {
    /// The value as a float.
    pub value: f64,

    /// If the source did not include a fractional part or exponent, the
    /// value as an integer. `Some` exactly when the type flag of the
    /// numeric token is "integer".
    pub int_value: Option<i64>,

    /// The verbatim source text of the literal, so that re-serialization
    /// is lossless (`1.0` is not rewritten to `1`).
    pub representation: String,
}

impl Token {
    /// For grouping tokens, the token for the matching bracket;
    /// a `Function` opens a parenthesis block, so it mirrors to
    /// `CloseParenthesis`. `None` for every other token.
    pub fn mirror(&self) -> Option<Token> {
        match *self {
            Token::Function(_) | Token::ParenthesisBlock => Some(Token::CloseParenthesis),
            Token::CloseParenthesis => Some(Token::ParenthesisBlock),
            Token::SquareBracketBlock => Some(Token::CloseSquareBracket),
            Token::CloseSquareBracket => Some(Token::SquareBracketBlock),
            Token::CurlyBracketBlock => Some(Token::CloseCurlyBracket),
            Token::CloseCurlyBracket => Some(Token::CurlyBracketBlock),
            _ => None,
        }
    }
}

/// Converts selector text into tokens, ending with exactly one
/// [`Token::EOF`].
///
/// Malformed input never fails: unterminated comments are swallowed, and
/// invalid strings/urls surface as the [`Token::BadString`] /
/// [`Token::BadUrl`] data tokens. The input is preprocessed per the CSS
/// Syntax rules (`CR`, `CRLF` and `FF` become `LF`, `NUL` becomes
/// U+FFFD) and then consumed as code points with up to three code points
/// of lookahead.
///
/// # Panics
///
/// Panics if the main loop runs more than twice the input length, which
/// would mean the tokenizer stopped making progress. This is a liveness
/// guard against implementation bugs, not a reachable grammar state.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(input);
    let ceiling = 2 * tokenizer.input.len();
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        tokens.push(token);
        if tokens.len() > ceiling {
            panic!("tokenizer is not making progress on {:?}", input);
        }
    }
    tokens.push(Token::EOF);
    tokens
}

const MAX_CODE_POINT: u32 = 0x10FFFF;

#[inline]
fn is_whitespace(c: char) -> bool {
    // The stream is preprocessed: CR and FF are already folded into LF.
    matches!(c, ' ' | '\t' | '\n')
}

#[inline]
fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

#[inline]
fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

#[inline]
fn is_non_printable(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{E}'..='\u{1F}' | '\u{7F}')
}

#[inline]
fn is_valid_escape(c1: Option<char>, c2: Option<char>) -> bool {
    c1 == Some('\\') && c2 != Some('\n')
}

fn would_start_identifier(c1: Option<char>, c2: Option<char>, c3: Option<char>) -> bool {
    match c1 {
        Some('-') => {
            matches!(c2, Some(c) if is_name_start(c)) || c2 == Some('-') || is_valid_escape(c2, c3)
        }
        Some('\\') => is_valid_escape(c1, c2),
        Some(c) => is_name_start(c),
        None => false,
    }
}

fn would_start_number(c1: Option<char>, c2: Option<char>, c3: Option<char>) -> bool {
    match c1 {
        Some('+') | Some('-') => {
            matches!(c2, Some(c) if c.is_ascii_digit())
                || (c2 == Some('.') && matches!(c3, Some(c) if c.is_ascii_digit()))
        }
        Some('.') => matches!(c2, Some(c) if c.is_ascii_digit()),
        Some(c) => c.is_ascii_digit(),
        None => false,
    }
}

/// Materializes the input as a code point stream, applying the input
/// preprocessing rules of the CSS Syntax spec. (Rust strings are already
/// sequences of Unicode scalar values, so surrogate-pair recombination
/// is inherent to the input type.)
fn preprocess(input: &str) -> Vec<char> {
    let mut stream = Vec::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                stream.push('\n');
            }
            '\u{C}' => stream.push('\n'),
            '\0' => stream.push('\u{FFFD}'),
            _ => stream.push(c),
        }
    }
    stream
}

struct Tokenizer {
    input: Vec<char>,
    /// Counted in code points, not bytes. From 0.
    position: usize,
}

impl Tokenizer {
    fn new(input: &str) -> Tokenizer {
        Tokenizer {
            input: preprocess(input),
            position: 0,
        }
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.position += n;
    }

    // Assumes non-EOF.
    #[inline]
    fn consume_char(&mut self) -> char {
        let c = self.input[self.position];
        self.position += 1;
        c
    }

    #[inline]
    fn has_valid_escape(&self) -> bool {
        is_valid_escape(self.peek(0), self.peek(1))
    }

    /// Consumes one token, or returns `None` at end of input. Every call
    /// that returns `Some` advances the position by at least one.
    fn next_token(&mut self) -> Option<Token> {
        self.consume_comments();
        let c = self.peek(0)?;
        let token = match c {
            c if is_whitespace(c) => {
                while matches!(self.peek(0), Some(c) if is_whitespace(c)) {
                    self.advance(1);
                }
                Token::WhiteSpace
            }
            '"' | '\'' => self.consume_string(c),
            '#' => {
                if matches!(self.peek(1), Some(c) if is_name_char(c))
                    || is_valid_escape(self.peek(1), self.peek(2))
                {
                    let kind = if would_start_identifier(self.peek(1), self.peek(2), self.peek(3)) {
                        HashKind::Id
                    } else {
                        HashKind::Unrestricted
                    };
                    self.advance(1);
                    Token::Hash(self.consume_name(), kind)
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '$' => {
                if self.peek(1) == Some('=') {
                    self.advance(2);
                    Token::SuffixMatch
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '(' => {
                self.advance(1);
                Token::ParenthesisBlock
            }
            ')' => {
                self.advance(1);
                Token::CloseParenthesis
            }
            '*' => {
                if self.peek(1) == Some('=') {
                    self.advance(2);
                    Token::SubstringMatch
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '+' | '.' => {
                if would_start_number(self.peek(0), self.peek(1), self.peek(2)) {
                    self.consume_numeric()
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            ',' => {
                self.advance(1);
                Token::Comma
            }
            '-' => {
                if would_start_number(self.peek(0), self.peek(1), self.peek(2)) {
                    self.consume_numeric()
                } else if self.peek(1) == Some('-') && self.peek(2) == Some('>') {
                    self.advance(3);
                    Token::CDC
                } else if would_start_identifier(self.peek(0), self.peek(1), self.peek(2)) {
                    self.consume_ident_like()
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            ':' => {
                self.advance(1);
                Token::Colon
            }
            ';' => {
                self.advance(1);
                Token::Semicolon
            }
            '<' => {
                if self.peek(1) == Some('!')
                    && self.peek(2) == Some('-')
                    && self.peek(3) == Some('-')
                {
                    self.advance(4);
                    Token::CDO
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '@' => {
                if would_start_identifier(self.peek(1), self.peek(2), self.peek(3)) {
                    self.advance(1);
                    Token::AtKeyword(self.consume_name())
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '[' => {
                self.advance(1);
                Token::SquareBracketBlock
            }
            '\\' => {
                if self.has_valid_escape() {
                    self.consume_ident_like()
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            ']' => {
                self.advance(1);
                Token::CloseSquareBracket
            }
            '^' => {
                if self.peek(1) == Some('=') {
                    self.advance(2);
                    Token::PrefixMatch
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '{' => {
                self.advance(1);
                Token::CurlyBracketBlock
            }
            '|' => {
                if self.peek(1) == Some('=') {
                    self.advance(2);
                    Token::DashMatch
                } else if self.peek(1) == Some('|') {
                    self.advance(2);
                    Token::Column
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '}' => {
                self.advance(1);
                Token::CloseCurlyBracket
            }
            '~' => {
                if self.peek(1) == Some('=') {
                    self.advance(2);
                    Token::IncludeMatch
                } else {
                    self.advance(1);
                    Token::Delim(c)
                }
            }
            '0'..='9' => self.consume_numeric(),
            c if is_name_start(c) => self.consume_ident_like(),
            _ => {
                self.advance(1);
                Token::Delim(c)
            }
        };
        Some(token)
    }

    fn consume_comments(&mut self) {
        while self.peek(0) == Some('/') && self.peek(1) == Some('*') {
            self.advance(2);
            loop {
                match self.peek(0) {
                    // Unterminated comments are accepted silently.
                    None => return,
                    Some('*') if self.peek(1) == Some('/') => {
                        self.advance(2);
                        break;
                    }
                    Some(_) => self.advance(1),
                }
            }
        }
    }

    fn consume_string(&mut self, quote: char) -> Token {
        self.advance(1); // Skip the initial quote.
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => return Token::QuotedString(value),
                Some(c) if c == quote => {
                    self.advance(1);
                    return Token::QuotedString(value);
                }
                // The newline is reconsumed as the next token.
                Some('\n') => return Token::BadString,
                Some('\\') => {
                    self.advance(1);
                    match self.peek(0) {
                        // Escaped EOF: the backslash is dropped.
                        None => {}
                        // Escaped newline: line continuation.
                        Some('\n') => self.advance(1),
                        Some(_) => value.push(self.consume_escape()),
                    }
                }
                Some(c) => {
                    self.advance(1);
                    value.push(c);
                }
            }
        }
    }

    fn consume_ident_like(&mut self) -> Token {
        let value = self.consume_name();
        if self.peek(0) == Some('(') {
            self.advance(1);
            if value.eq_ignore_ascii_case("url") {
                // `url(` directly followed by a quote (possibly after
                // whitespace) stays a function; the quoted string is
                // tokenized separately.
                while matches!(self.peek(0), Some(c) if is_whitespace(c))
                    && matches!(self.peek(1), Some(c) if is_whitespace(c))
                {
                    self.advance(1);
                }
                if matches!(self.peek(0), Some('"') | Some('\''))
                    || (matches!(self.peek(0), Some(c) if is_whitespace(c))
                        && matches!(self.peek(1), Some('"') | Some('\'')))
                {
                    Token::Function(value)
                } else {
                    self.consume_url()
                }
            } else {
                Token::Function(value)
            }
        } else {
            Token::Ident(value)
        }
    }

    fn consume_name(&mut self) -> String {
        let mut value = String::new();
        loop {
            match self.peek(0) {
                Some(c) if is_name_char(c) => {
                    self.advance(1);
                    value.push(c);
                }
                Some('\\') if self.has_valid_escape() => {
                    self.advance(1);
                    value.push(self.consume_escape());
                }
                _ => return value,
            }
        }
    }

    fn consume_numeric(&mut self) -> Token {
        let value = self.consume_number();
        if would_start_identifier(self.peek(0), self.peek(1), self.peek(2)) {
            let unit = self.consume_name();
            Token::Dimension(value, unit)
        } else if self.peek(0) == Some('%') {
            self.advance(1);
            Token::Percentage(value)
        } else {
            Token::Number(value)
        }
    }

    // Consumes [+-]?\d*(\.\d+)?([eE][+-]?\d+)?, keeping the source text
    // verbatim. Only called when `would_start_number` matched, so there
    // is at least one digit.
    fn consume_number(&mut self) -> NumericValue {
        let mut repr = String::new();
        let mut is_integer = true;
        if matches!(self.peek(0), Some('+') | Some('-')) {
            repr.push(self.consume_char());
        }
        self.consume_digits(&mut repr);
        if self.peek(0) == Some('.') && matches!(self.peek(1), Some(c) if c.is_ascii_digit()) {
            repr.push(self.consume_char());
            repr.push(self.consume_char());
            is_integer = false;
            self.consume_digits(&mut repr);
        }
        if matches!(self.peek(0), Some('e') | Some('E')) {
            if matches!(self.peek(1), Some(c) if c.is_ascii_digit()) {
                repr.push(self.consume_char());
                repr.push(self.consume_char());
                is_integer = false;
                self.consume_digits(&mut repr);
            } else if matches!(self.peek(1), Some('+') | Some('-'))
                && matches!(self.peek(2), Some(c) if c.is_ascii_digit())
            {
                repr.push(self.consume_char());
                repr.push(self.consume_char());
                repr.push(self.consume_char());
                is_integer = false;
                self.consume_digits(&mut repr);
            }
        }
        NumericValue {
            // The representation is guaranteed to match the float grammar.
            value: repr.parse().unwrap_or(0.0),
            int_value: if is_integer { repr.parse().ok() } else { None },
            representation: repr,
        }
    }

    fn consume_digits(&mut self, repr: &mut String) {
        while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
            repr.push(self.consume_char());
        }
    }

    fn consume_url(&mut self) -> Token {
        let mut value = String::new();
        while matches!(self.peek(0), Some(c) if is_whitespace(c)) {
            self.advance(1);
        }
        loop {
            match self.peek(0) {
                None => return Token::Url(value),
                Some(')') => {
                    self.advance(1);
                    return Token::Url(value);
                }
                Some(c) if is_whitespace(c) => {
                    // Whitespace is tolerated once, before the closing paren.
                    while matches!(self.peek(0), Some(c) if is_whitespace(c)) {
                        self.advance(1);
                    }
                    match self.peek(0) {
                        None => return Token::Url(value),
                        Some(')') => {
                            self.advance(1);
                            return Token::Url(value);
                        }
                        Some(_) => return self.consume_bad_url(),
                    }
                }
                Some('"') | Some('\'') | Some('(') => {
                    self.advance(1);
                    return self.consume_bad_url();
                }
                Some(c) if is_non_printable(c) => {
                    self.advance(1);
                    return self.consume_bad_url();
                }
                Some('\\') => {
                    if self.has_valid_escape() {
                        self.advance(1);
                        value.push(self.consume_escape());
                    } else {
                        return self.consume_bad_url();
                    }
                }
                Some(c) => {
                    self.advance(1);
                    value.push(c);
                }
            }
        }
    }

    // Consumes up to and including the next unescaped `)`.
    fn consume_bad_url(&mut self) -> Token {
        loop {
            match self.peek(0) {
                None => return Token::BadUrl,
                Some(')') => {
                    self.advance(1);
                    return Token::BadUrl;
                }
                Some('\\') if self.has_valid_escape() => {
                    self.advance(1);
                    self.consume_escape();
                }
                Some(_) => self.advance(1),
            }
        }
    }

    // Assumes the `\` has already been consumed and that the next code
    // point is not a newline.
    fn consume_escape(&mut self) -> char {
        let c = match self.peek(0) {
            None => return '\u{FFFD}', // Escaped EOF.
            Some(c) => c,
        };
        self.advance(1);
        if c.is_ascii_hexdigit() {
            let mut hex = String::new();
            hex.push(c);
            while hex.len() < 6 {
                match self.peek(0) {
                    Some(d) if d.is_ascii_hexdigit() => {
                        hex.push(d);
                        self.advance(1);
                    }
                    _ => break,
                }
            }
            // One whitespace code point after the digits belongs to the escape.
            if matches!(self.peek(0), Some(c) if is_whitespace(c)) {
                self.advance(1);
            }
            let value = u32::from_str_radix(&hex, 16).unwrap_or(0);
            if value == 0 || value > MAX_CODE_POINT {
                return '\u{FFFD}';
            }
            // Surrogate code points also map to the replacement character.
            std::char::from_u32(value).unwrap_or('\u{FFFD}')
        } else {
            c
        }
    }
}

impl std::fmt::Display for Token {
    #[inline]
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.to_css(formatter)
    }
}
